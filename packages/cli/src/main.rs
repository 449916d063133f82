//! `sigchain`: command-line interface for did:key identities and signed
//! message feeds.
//!
//! Subcommands:
//!
//! - **`keygen`**: create a keypair and print its exported JSON form.
//! - **`did`** / **`decode`**: derive a DID from a key file, or a public key
//!   from a DID.
//! - **`new`** / **`append`**: sign a new message, standalone or at the end
//!   of a feed file.
//! - **`verify`** / **`verify-feed`**: check signatures and chain links.
//! - **`id`** / **`render`**: inspect messages and feeds.
//!
//! Message and feed inputs are read from a file path or from stdin (`-`).
//! Logs go to stderr; see [`config::CliConfig`] for environment variables.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use sigchain::{
    canonical, create_message_from_value, did, message_id, render, validate_message, verify_feed,
    ExportedKeys, Feed, KeyPair, Message, PublicKey,
};

use config::{CliConfig, DEFAULT_LOG_FILTER};

/// sigchain: self-certifying identities and signed message feeds
#[derive(Parser)]
#[command(name = "sigchain", version, about, long_about = None)]
struct Cli {
    /// Exported key file to sign with. Overrides SIGCHAIN_KEYS.
    #[arg(long, global = true, value_name = "FILE")]
    keys: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new P-256 keypair and print it as JSON.
    ///
    /// The DID is printed to stderr. With --out the keys are written to FILE
    /// instead of stdout.
    Keygen {
        /// Write the exported keys here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the DID of the configured key file.
    Did,

    /// Decode a did:key into its base64 public key and algorithm tag.
    Decode {
        /// A DID of the form did:key:z...
        did: String,
    },

    /// Create and sign a new message and print it as JSON.
    ///
    /// Without --prev this is the first message of a feed.
    ///
    /// Examples:
    ///   sigchain new -c '{"type":"post","text":"hello"}'
    ///   sigchain new --prev first.json -c '{"type":"post","text":"again"}'
    New {
        /// Message content: a JSON object, or a JSON string for encrypted payloads.
        #[arg(short, long, value_name = "JSON")]
        content: String,

        /// The message this one extends.
        #[arg(short, long, value_name = "FILE")]
        prev: Option<PathBuf>,
    },

    /// Append a new message to a feed file (a JSON array) and print the feed.
    Append {
        /// Path to the feed, or `-` for stdin.
        feed: PathBuf,

        /// Message content: a JSON object, or a JSON string for encrypted payloads.
        #[arg(short, long, value_name = "JSON")]
        content: String,
    },

    /// Verify a message's signature and its link to a predecessor.
    ///
    /// Exits 0 if valid, 1 if invalid, 2 on malformed input.
    Verify {
        /// Path to the message, or `-` for stdin.
        file: PathBuf,

        /// The message it claims to extend. Omit for a first message.
        #[arg(short, long, value_name = "FILE")]
        prev: Option<PathBuf>,

        /// Base64 public key to verify with. Defaults to the key in the
        /// message's author DID.
        #[arg(long, value_name = "BASE64")]
        public_key: Option<String>,
    },

    /// Verify an entire feed from its first message.
    VerifyFeed {
        /// Path to the feed, or `-` for stdin.
        feed: PathBuf,
    },

    /// Print the id of a message.
    Id {
        /// Path to the message, or `-` for stdin.
        file: PathBuf,
    },

    /// Render a message or a feed as human-readable text.
    Render {
        /// Path to a message or feed, or `-` for stdin.
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = CliConfig::from_env().with_keys_path(cli.keys.clone());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Keygen { out } => {
            let keys = KeyPair::generate();
            let exported = keys.export().unwrap_or_else(|e| fatal(&e.to_string()));
            let json = to_json(&exported);
            match out {
                Some(path) => {
                    fs::write(&path, format!("{json}\n")).unwrap_or_else(|e| {
                        fatal(&format!("failed to write {}: {}", path.display(), e))
                    });
                    tracing::info!(path = %path.display(), "wrote keys");
                }
                None => println!("{json}"),
            }
            eprintln!("{}", keys.did());
        }

        Command::Did => {
            println!("{}", load_keys(&config.keys_path).did());
        }

        Command::Decode { did } => {
            let (key, algorithm) = did::decode(&did).unwrap_or_else(|e| fatal(&e.to_string()));
            let out = serde_json::json!({
                "publicKey": STANDARD.encode(key),
                "type": algorithm.to_string(),
            });
            println!("{}", to_json(&out));
        }

        Command::New { content, prev } => {
            let keys = load_keys(&config.keys_path);
            let previous = prev.map(|p| parse_message(&read_input(&p)));
            let content = parse_content(&content);
            let msg = create_message_from_value(&keys, previous.as_ref(), content)
                .unwrap_or_else(|e| fatal(&format!("cannot create message: {e}")));
            println!("{}", to_json(&msg));
        }

        Command::Append { feed, content } => {
            let keys = load_keys(&config.keys_path);
            let messages = parse_feed(&read_input(&feed));
            let mut feed = Feed::from_messages(keys.public_key().clone(), messages)
                .unwrap_or_else(|e| fatal(&format!("existing feed is invalid: {e}")));
            let content = sigchain::Content::from_value(parse_content(&content))
                .unwrap_or_else(|| fatal("content must be a JSON object or string"));
            feed.publish(&keys, content)
                .unwrap_or_else(|e| fatal(&format!("cannot append message: {e}")));
            println!("{}", to_json(feed.messages()));
        }

        Command::Verify {
            file,
            prev,
            public_key,
        } => {
            let msg = parse_message(&read_input(&file));
            let previous = prev.map(|p| parse_message(&read_input(&p)));
            let public_key = match public_key {
                Some(b64) => PublicKey::from_base64(&b64).unwrap_or_else(|e| fatal(&e.to_string())),
                None => PublicKey::from_did(&msg.author).unwrap_or_else(|e| fatal(&e.to_string())),
            };
            match validate_message(&msg, previous.as_ref(), &public_key) {
                Ok(true) => println!("valid"),
                Ok(false) => {
                    eprintln!("invalid: signature or chain link does not verify");
                    process::exit(1);
                }
                Err(e) => fatal(&e.to_string()),
            }
        }

        Command::VerifyFeed { feed } => {
            let messages = parse_feed(&read_input(&feed));
            let Some(first) = messages.first() else {
                fatal("feed is empty");
            };
            let public_key =
                PublicKey::from_did(&first.author).unwrap_or_else(|e| fatal(&e.to_string()));
            match verify_feed(&messages, &public_key) {
                Ok(true) => println!("all {} messages valid", messages.len()),
                Ok(false) => {
                    eprintln!("invalid: feed does not verify");
                    process::exit(1);
                }
                Err(e) => fatal(&e.to_string()),
            }
        }

        Command::Id { file } => {
            let msg = parse_message(&read_input(&file));
            println!("{}", message_id(&msg).unwrap_or_else(|e| fatal(&e.to_string())));
        }

        Command::Render { file } => {
            let value: serde_json::Value = serde_json::from_str(&read_input(&file))
                .unwrap_or_else(|e| fatal(&format!("not valid JSON: {}", e)));
            // A single message is rendered in full; an array gets the feed summary.
            print!("{}", render::render_value(value).unwrap_or_else(|e| fatal(&e.to_string())));
        }
    }
}

/// Read and import the exported key file.
fn load_keys(path: &Path) -> KeyPair {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        fatal(&format!(
            "failed to read keys from {}: {} (run `sigchain keygen --out {}` first)",
            path.display(),
            e,
            path.display()
        ))
    });
    let exported: ExportedKeys = serde_json::from_str(&json)
        .unwrap_or_else(|e| fatal(&format!("{} is not an exported key file: {}", path.display(), e)));
    KeyPair::import(&exported).unwrap_or_else(|e| fatal(&e.to_string()))
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &Path) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

fn parse_message(json: &str) -> Message {
    serde_json::from_str(json).unwrap_or_else(|e| fatal(&format!("not a valid message: {}", e)))
}

fn parse_feed(json: &str) -> Vec<Message> {
    serde_json::from_str(json).unwrap_or_else(|e| fatal(&format!("not a valid feed: {}", e)))
}

fn parse_content(json: &str) -> serde_json::Value {
    serde_json::from_str(json).unwrap_or_else(|e| fatal(&format!("content is not JSON: {}", e)))
}

/// Canonical (two-space indented, field-order preserving) JSON.
fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    canonical::to_canonical_string(value).unwrap_or_else(|e| fatal(&format!("serialization failed: {}", e)))
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("sigchain: {}", msg);
    process::exit(2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_new_with_prev() {
        let cli = Cli::try_parse_from([
            "sigchain",
            "--keys",
            "alice.json",
            "new",
            "-c",
            r#"{"text":"hi"}"#,
            "--prev",
            "m1.json",
        ])
        .unwrap();
        assert_eq!(cli.keys, Some(PathBuf::from("alice.json")));
        match cli.command {
            Command::New { content, prev } => {
                assert_eq!(content, r#"{"text":"hi"}"#);
                assert_eq!(prev, Some(PathBuf::from("m1.json")));
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn parses_verify_feed() {
        let cli = Cli::try_parse_from(["sigchain", "verify-feed", "-"]).unwrap();
        assert!(matches!(cli.command, Command::VerifyFeed { feed } if feed == Path::new("-")));
    }

    #[test]
    fn new_requires_content() {
        assert!(Cli::try_parse_from(["sigchain", "new"]).is_err());
    }
}
