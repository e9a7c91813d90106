//! Minimal command set.
//!
//! Execution failures are echoed back into the originating channel; the relay
//! paths stay silent toward users, commands do not.

use serenity::model::channel::Message;
use serenity::prelude::*;

use tracing::warn;

pub async fn execute(ctx: &Context, msg: &Message, body: &str) {
    let (name, args) = parse_command(body);

    let reply = match name.as_str() {
        "test" => "Success".to_string(),
        "repeat" => {
            if args.is_empty() {
                "repeat: nothing to repeat".to_string()
            } else {
                args
            }
        }
        "" => "expected a command".to_string(),
        other => format!("unknown command: {other}"),
    };

    if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
        warn!(channel = msg.channel_id.get(), error = %e, "failed to answer command");
    }
}

fn parse_command(body: &str) -> (String, String) {
    let mut parts = body.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").trim().to_lowercase();
    let rest = parts.next().unwrap_or("").trim().to_string();
    (name, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_arguments() {
        assert_eq!(
            parse_command("repeat hello world"),
            ("repeat".to_string(), "hello world".to_string())
        );
    }

    #[test]
    fn lowercases_the_name() {
        assert_eq!(parse_command("TEST"), ("test".to_string(), String::new()));
    }

    #[test]
    fn tolerates_leading_whitespace() {
        assert_eq!(
            parse_command("  repeat  hi"),
            ("repeat".to_string(), "hi".to_string())
        );
    }
}
