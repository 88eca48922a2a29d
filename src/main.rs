//! Main entry point for the duel client.
//!
//! Authenticates against the game server, opens the WebSocket event channel,
//! and starts the session and lobby actors. User commands are read from
//! stdin and relayed to the session actor.

use std::io::{BufRead, Write as _};

use actix::Actor;
use client::auth::AuthClient;
use client::lobby::LobbyPoller;
use client::presenter::{ConsolePresenter, Presenter};
use client::session::{AcceptMatch, DuelSession, MakeMove, Quit, RequestMatch};
use config::client::{DEFAULT_BASE_URL, WS_PATH};
use config::matchmaking::MATCH_ERROR_POLICY;
use duel::machine::{DuelClient, Effect};
use log::info;
use tokio::sync::oneshot;

pub mod config;
mod client;
mod duel;
#[cfg(test)]
mod tests;

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (default to info level).
    env_logger::init();

    let base_url =
        std::env::var("FLOOR_DUEL_SERVER").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let register = std::env::args().nth(1).as_deref() == Some("register");

    let username = prompt("username")?;
    let password = prompt("password")?;

    // Credential exchange; the server owns validation and the initial floor.
    let auth = AuthClient::new(&base_url);
    let outcome = if register {
        auth.register(&username, &password).await
    } else {
        auth.login(&username, &password).await
    };
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(());
        }
    };
    println!("{}", outcome.message);

    // Session init happens exactly once, on successful auth.
    let mut presenter = ConsolePresenter;
    let mut machine = DuelClient::new(MATCH_ERROR_POLICY);
    for effect in machine.establish_identity(&username, outcome.floor) {
        match effect {
            Effect::Render { region, text } => presenter.render(region, &text),
            Effect::SetSearchEnabled(enabled) => presenter.set_search_enabled(enabled),
            _ => {}
        }
    }

    // Open the event channel.
    let ws_url = format!("{}{}", base_url.replacen("http", "ws", 1), WS_PATH);
    let (_response, framed) = awc::Client::new()
        .ws(&ws_url)
        .connect()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    info!("[Main] Connected to {}", ws_url);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let session = DuelSession::start_with(machine, framed, Box::new(ConsolePresenter), shutdown_tx);
    let _lobby = LobbyPoller::new(&base_url, Box::new(ConsolePresenter)).start();

    // Relay stdin commands to the session actor.
    let addr = session.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            match line.split_once(' ') {
                Some(("move", choice)) => addr.do_send(MakeMove(choice.to_string())),
                None if line == "find" => addr.do_send(RequestMatch),
                None if line == "accept" => addr.do_send(AcceptMatch),
                None if line == "quit" => {
                    addr.do_send(Quit);
                    break;
                }
                _ if line.is_empty() => {}
                _ => println!("commands: find | accept | move <rock|paper|scissors> | quit"),
            }
        }
    });

    tokio::select! {
        _ = shutdown_rx => info!("[Main] Session closed"),
        _ = tokio::signal::ctrl_c() => info!("[Main] Interrupted"),
    }
    Ok(())
}
