/// Lobby polling actor.
///
/// Refreshes two public, read-only views at a fixed interval: the ranked
/// leaderboard and the active-user count. Each tick fires a fresh request
/// whether or not the previous one finished; completions land in whatever
/// order the network produces and simply overwrite the displayed value
/// (last write wins). A failed poll renders a placeholder and the interval
/// keeps running.
use actix::prelude::*;
use awc::Client;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use crate::client::presenter::Presenter;
use crate::config::client::{ACTIVE_USERS_PATH, LEADERBOARD_PATH};
use crate::config::lobby::{ACTIVE_COUNT_POLL_SECS, LEADERBOARD_POLL_SECS};
use crate::duel::machine::Region;

/// One ranked-list row as the server reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub floor: u32,
    pub online: bool,
}

#[derive(Deserialize)]
struct ActiveUsers {
    active: u64,
}

pub struct LobbyPoller {
    http: Client,
    base_url: String,
    presenter: Box<dyn Presenter>,
}

impl LobbyPoller {
    pub fn new(base_url: &str, presenter: Box<dyn Presenter>) -> Self {
        Self { http: Client::new(), base_url: base_url.to_string(), presenter }
    }

    fn poll_leaderboard(&self, ctx: &mut Context<Self>) {
        let http = self.http.clone();
        let url = format!("{}{}", self.base_url, LEADERBOARD_PATH);
        async move {
            match http.get(url).send().await {
                Ok(mut response) => response
                    .json::<Vec<LeaderboardEntry>>()
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        }
        .into_actor(self)
        .map(|result, act, _ctx| match result {
            Ok(entries) => {
                act.presenter.render(Region::Leaderboard, &format_leaderboard(&entries));
            }
            Err(e) => {
                debug!("[Lobby] Leaderboard poll failed: {}", e);
                act.presenter.render(Region::Leaderboard, "Leaderboard unavailable");
            }
        })
        .spawn(ctx);
    }

    fn poll_active_count(&self, ctx: &mut Context<Self>) {
        let http = self.http.clone();
        let url = format!("{}{}", self.base_url, ACTIVE_USERS_PATH);
        async move {
            match http.get(url).send().await {
                Ok(mut response) => {
                    response.json::<ActiveUsers>().await.map_err(|e| e.to_string())
                }
                Err(e) => Err(e.to_string()),
            }
        }
        .into_actor(self)
        .map(|result, act, _ctx| match result {
            Ok(body) => {
                act.presenter
                    .render(Region::ActiveCount, &format!("{} players online", body.active));
            }
            Err(e) => {
                debug!("[Lobby] Active-count poll failed: {}", e);
                act.presenter.render(Region::ActiveCount, "?");
            }
        })
        .spawn(ctx);
    }
}

impl Actor for LobbyPoller {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Immediate first refresh, then fixed intervals with no cancellation
        // or backpressure semantics.
        self.poll_leaderboard(ctx);
        self.poll_active_count(ctx);
        ctx.run_interval(Duration::from_secs(LEADERBOARD_POLL_SECS), |act, ctx| {
            act.poll_leaderboard(ctx);
        });
        ctx.run_interval(Duration::from_secs(ACTIVE_COUNT_POLL_SECS), |act, ctx| {
            act.poll_active_count(ctx);
        });
    }
}

fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let status = if entry.online { "on " } else { "off" };
            format!("{:>2}. [{}] {} - floor {}", i + 1, status, entry.username, entry.floor)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
