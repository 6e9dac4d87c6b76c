use std::io::{self, Write};

use bytes::Bytes;
use clap::Parser;
use tokio::time::Duration;

use emberkv_client::{Client, ClientConfig};
use emberkv_common::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RECONNECT_DELAY_MS};

#[derive(Parser, Debug)]
#[command(name = "emberkv-cli", about = "EmberKV CLI client")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

/// Comando aceito no prompt.
#[derive(Debug, PartialEq)]
enum CliCommand {
    Put(String, String),
    Get(String),
    Take(String),
    Quit,
}

/// Faz o parse de uma linha do prompt.
///
/// O valor de `put` é o resto da linha após a chave, espaços inclusos.
fn parse_command(line: &str) -> Result<CliCommand, String> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or("").to_lowercase();

    match verb.as_str() {
        "put" => {
            let key = tokens
                .next()
                .ok_or_else(|| "uso: put <chave> <valor>".to_string())?;
            let rest: Vec<&str> = tokens.collect();
            if rest.is_empty() {
                return Err("uso: put <chave> <valor>".to_string());
            }
            Ok(CliCommand::Put(key.to_string(), rest.join(" ")))
        }
        "get" => {
            let key = tokens.next().ok_or_else(|| "uso: get <chave>".to_string())?;
            Ok(CliCommand::Get(key.to_string()))
        }
        "take" => {
            let key = tokens
                .next()
                .ok_or_else(|| "uso: take <chave>".to_string())?;
            Ok(CliCommand::Take(key.to_string()))
        }
        "quit" | "exit" => Ok(CliCommand::Quit),
        other => Err(format!("comando desconhecido: '{other}'")),
    }
}

/// Formata o resultado de uma leitura para exibição humana.
fn format_value(value: Option<Bytes>) -> String {
    match value {
        None => "(nil)".to_string(),
        Some(data) => match std::str::from_utf8(&data) {
            Ok(s) => format!("\"{s}\""),
            Err(_) => format!("(binary) {} bytes", data.len()),
        },
    }
}

async fn run_command(client: &Client, command: CliCommand) -> anyhow::Result<String> {
    match command {
        CliCommand::Put(key, value) => {
            client.put(key, Bytes::from(value)).await?;
            Ok("OK".to_string())
        }
        CliCommand::Get(key) => Ok(format_value(client.get(key).await?)),
        CliCommand::Take(key) => Ok(format_value(client.take(key).await?)),
        CliCommand::Quit => Ok(String::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let config = ClientConfig {
        addr: addr.clone(),
        reconnect: true,
        reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
    };
    let client = Client::connect(config).await?;

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        let line = args.command.join(" ");
        let command = parse_command(&line).map_err(|e| anyhow::anyhow!(e))?;
        println!("{}", run_command(&client, command).await?);
        return Ok(());
    }

    println!("Conectado a {addr}");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("emberkv> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(CliCommand::Quit) => break,
            Ok(command) => match run_command(&client, command).await {
                Ok(output) => println!("{output}"),
                Err(e) => println!("(error) {e}"),
            },
            Err(usage) => println!("(error) {usage}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_put_joins_value_tokens() {
        assert_eq!(
            parse_command("put key hello world").unwrap(),
            CliCommand::Put("key".into(), "hello world".into())
        );
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            parse_command("GET key").unwrap(),
            CliCommand::Get("key".into())
        );
    }

    #[test]
    fn parse_take() {
        assert_eq!(
            parse_command("take key").unwrap(),
            CliCommand::Take("key".into())
        );
    }

    #[test]
    fn parse_quit_and_exit() {
        assert_eq!(parse_command("quit").unwrap(), CliCommand::Quit);
        assert_eq!(parse_command("exit").unwrap(), CliCommand::Quit);
    }

    #[test]
    fn parse_put_without_value_fails() {
        assert!(parse_command("put key").is_err());
        assert!(parse_command("put").is_err());
    }

    #[test]
    fn parse_unknown_verb_fails() {
        let err = parse_command("drop key").unwrap_err();
        assert!(err.contains("drop"));
    }

    #[test]
    fn format_missing_value() {
        assert_eq!(format_value(None), "(nil)");
    }

    #[test]
    fn format_text_value() {
        assert_eq!(format_value(Some(Bytes::from("v"))), "\"v\"");
    }

    #[test]
    fn format_binary_value() {
        let value = Bytes::from(vec![0xC3, 0x28, 0x00]);
        assert_eq!(format_value(Some(value)), "(binary) 3 bytes");
    }
}
