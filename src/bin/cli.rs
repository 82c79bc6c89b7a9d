//! mcbin CLI Client
//!
//! Command-line interface for talking to a memcached server.

use clap::{Parser, Subcommand};
use mcbin::{Client, Config, McError, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// mcbin CLI
#[derive(Parser, Debug)]
#[command(name = "mcbin-cli")]
#[command(about = "CLI for memcached over the binary protocol")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "11211")]
    port: u16,

    /// Response timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expiration in seconds (0 = never)
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Store only if the key is new
    Add {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Store only if the key exists
    Replace {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Append to an existing value
    Append { key: String, value: String },

    /// Prepend to an existing value
    Prepend { key: String, value: String },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Set a new expiration on a key
    Touch { key: String, ttl: u32 },

    /// Increment a counter
    Incr {
        key: String,
        #[arg(default_value = "1")]
        offset: u64,
        /// Value to create the counter with if missing
        #[arg(long, default_value = "0")]
        initial: u64,
    },

    /// Decrement a counter
    Decr {
        key: String,
        #[arg(default_value = "1")]
        offset: u64,
        #[arg(long, default_value = "0")]
        initial: u64,
    },

    /// Invalidate all items
    Flush {
        #[arg(long, default_value = "0")]
        delay: u32,
    },

    /// Print the server version
    Version,

    /// Print server statistics
    Stats {
        /// Statistics category (items, slabs, settings, ...)
        kind: Option<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mcbin=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .timeout_ms(args.timeout_ms)
        .build();

    if let Err(e) = run(config, args.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> Result<(), McError> {
    let client = Client::new(config)?;

    match command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(not found)"),
        },
        Commands::Set { key, value, ttl } => report(client.set(&key, parse_value(&value), ttl)?),
        Commands::Add { key, value, ttl } => report(client.add(&key, parse_value(&value), ttl)?),
        Commands::Replace { key, value, ttl } => {
            report(client.replace(&key, parse_value(&value), ttl)?)
        }
        Commands::Append { key, value } => report(client.append(&key, value)?),
        Commands::Prepend { key, value } => report(client.prepend(&key, value)?),
        Commands::Delete { key } => report(client.delete(&key)?),
        Commands::Touch { key, ttl } => report(client.touch(&key, ttl)?),
        Commands::Incr { key, offset, initial } => {
            println!("{}", client.increment(&key, offset, initial, 0)?)
        }
        Commands::Decr { key, offset, initial } => {
            println!("{}", client.decrement(&key, offset, initial, 0)?)
        }
        Commands::Flush { delay } => report(client.flush(delay)?),
        Commands::Version => println!("{}", client.version()?),
        Commands::Stats { kind } => {
            let mut stats: Vec<_> = client.stats(kind.as_deref())?.into_iter().collect();
            stats.sort();
            for (name, value) in stats {
                println!("{} {}", name, value);
            }
        }
    }

    Ok(())
}

/// Store numbers and booleans with their type tag, everything else as text
fn parse_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Long(n);
    }
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(x) = raw.parse::<f64>() {
            return Value::Double(x);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::from(raw),
    }
}

fn report(ok: bool) {
    println!("{}", if ok { "OK" } else { "NOT_STORED" });
}
