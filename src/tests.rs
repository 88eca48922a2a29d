#[cfg(test)]
mod tests {
    use crate::duel::error::CommandError;
    use crate::duel::machine::{
        ConnectionEvent, DuelClient, Effect, MatchErrorPolicy, Region,
    };
    use crate::duel::messages::{ClientWsMessage, ServerWsMessage};
    use crate::duel::types::{DuelPhase, Move, Outcome, SearchToken};
    use serde_json::json;
    use std::time::Duration;

    /// An authenticated, connected client at floor 1.
    fn connected_client(name: &str) -> DuelClient {
        let mut client = DuelClient::new(MatchErrorPolicy::ClearSession);
        client.establish_identity(name, 1);
        client.handle_connection(ConnectionEvent::Opened);
        client
    }

    /// Drive a client from idle to the Choosing phase, returning the search
    /// token that was scheduled along the way.
    fn start_round(client: &mut DuelClient, opponent: &str) -> SearchToken {
        let effects = client.request_match().expect("search should start");
        let token = scheduled_token(&effects).expect("a timer must be scheduled");
        client.handle_server(ServerWsMessage::MatchFound { opponent: opponent.to_string() });
        client.accept_match().expect("acceptance should be valid");
        client.handle_server(ServerWsMessage::StartGame {
            message: "Both players accepted. Pick your move.".to_string(),
        });
        token
    }

    fn scheduled_token(effects: &[Effect]) -> Option<SearchToken> {
        effects.iter().find_map(|e| match e {
            Effect::StartSearchTimer { token, .. } => Some(*token),
            _ => None,
        })
    }

    fn sent_messages(effects: &[Effect]) -> Vec<&ClientWsMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn rendered_text(effects: &[Effect], region: Region) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Render { region: r, text } if *r == region => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// MatchSession is non-empty iff the duel phase is non-Idle.
    fn assert_session_invariant(client: &DuelClient) {
        assert_eq!(client.opponent().is_some(), client.phase() != DuelPhase::Idle);
    }

    #[test]
    fn test_request_match_while_disconnected_fails() {
        let mut client = DuelClient::new(MatchErrorPolicy::ClearSession);
        client.establish_identity("alice", 1);
        // Never connected: no timer, no send, just the precondition failure.
        assert_eq!(client.request_match(), Err(CommandError::NotConnected));
        assert!(!client.is_searching());
    }

    #[test]
    fn test_request_match_while_in_match_fails() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");
        assert_eq!(client.request_match(), Err(CommandError::AlreadyInMatch));
    }

    #[test]
    fn test_request_match_while_searching_fails() {
        let mut client = connected_client("alice");
        let effects = client.request_match().unwrap();
        let token = scheduled_token(&effects).unwrap();

        // A second search while one is pending is forbidden: no second
        // timer, no second find_match.
        assert_eq!(client.request_match(), Err(CommandError::SearchPending));
        assert!(client.is_searching());

        // The original search is still the active one.
        let effects = client.handle_search_timeout(token);
        assert!(effects.contains(&Effect::SetSearchEnabled(true)));
        assert!(!client.is_searching());
    }

    #[test]
    fn test_request_match_without_identity_fails() {
        let mut client = DuelClient::new(MatchErrorPolicy::ClearSession);
        client.handle_connection(ConnectionEvent::Opened);
        assert_eq!(client.request_match(), Err(CommandError::NotAuthenticated));
        assert!(!client.is_searching());
    }

    #[test]
    fn test_request_match_schedules_timeout_and_sends_find() {
        let mut client = connected_client("alice");
        let effects = client.request_match().unwrap();

        assert!(client.is_searching());
        assert!(effects.contains(&Effect::SetSearchEnabled(false)));
        let duration = effects
            .iter()
            .find_map(|e| match e {
                Effect::StartSearchTimer { duration, .. } => Some(*duration),
                _ => None,
            })
            .expect("a timer must be scheduled");
        assert_eq!(duration, Duration::from_secs(30));
        assert_eq!(
            sent_messages(&effects),
            vec![&ClientWsMessage::find_match("alice")]
        );
    }

    #[test]
    fn test_match_found_wins_race_against_timeout() {
        let mut client = connected_client("alice");
        let effects = client.request_match().unwrap();
        let token = scheduled_token(&effects).unwrap();

        // Match found at t=2s: cancellation must win the race.
        let effects =
            client.handle_server(ServerWsMessage::MatchFound { opponent: "bob".to_string() });
        assert!(effects.contains(&Effect::CancelSearchTimer));
        assert_eq!(client.phase(), DuelPhase::AwaitingAcceptance);
        assert_eq!(client.opponent(), Some("bob"));

        // The scheduled timer fires anyway: strictly no side effect.
        let effects = client.handle_search_timeout(token);
        assert!(effects.is_empty());
        assert_eq!(client.opponent(), Some("bob"));
    }

    #[test]
    fn test_search_timeout_re_enables_search() {
        let mut client = connected_client("alice");
        let effects = client.request_match().unwrap();
        let token = scheduled_token(&effects).unwrap();

        let effects = client.handle_search_timeout(token);
        assert!(effects.contains(&Effect::SetSearchEnabled(true)));
        assert!(rendered_text(&effects, Region::Status)
            .iter()
            .any(|t| t.contains("No opponent found")));
        assert!(!client.is_searching());
        assert_eq!(client.opponent(), None);

        // Firing twice is a no-op.
        assert!(client.handle_search_timeout(token).is_empty());
    }

    #[test]
    fn test_stale_timeout_token_is_ignored() {
        let mut client = connected_client("alice");
        client.request_match().unwrap();

        // A token from some earlier search must not touch the active one.
        let effects = client.handle_search_timeout(SearchToken(0));
        assert!(effects.is_empty());
        assert!(client.is_searching());
    }

    #[test]
    fn test_session_invariant_across_full_round() {
        let mut client = connected_client("alice");
        assert_session_invariant(&client);

        client.request_match().unwrap();
        assert_session_invariant(&client);

        client.handle_server(ServerWsMessage::MatchFound { opponent: "bob".to_string() });
        assert_session_invariant(&client);

        client.accept_match().unwrap();
        assert_session_invariant(&client);

        client.handle_server(ServerWsMessage::StartGame { message: "go".to_string() });
        assert_session_invariant(&client);

        client.make_move("rock").unwrap();
        assert_session_invariant(&client);

        client.handle_server(ServerWsMessage::GameResult {
            your_move: Move::Rock,
            opponent_move: Move::Paper,
            result: Outcome::Lose,
            new_floor: 1,
        });
        assert_session_invariant(&client);
        assert_eq!(client.phase(), DuelPhase::Idle);
    }

    #[test]
    fn test_duplicate_game_result_is_noop() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");
        client.make_move("rock").unwrap();

        let result = ServerWsMessage::GameResult {
            your_move: Move::Rock,
            opponent_move: Move::Scissors,
            result: Outcome::Win,
            new_floor: 4,
        };
        let effects = client.handle_server(result.clone());
        assert!(!effects.is_empty());
        assert_eq!(client.floor(), 4);

        // At-least-once delivery: the retry finds the session already empty.
        let effects = client.handle_server(result);
        assert!(effects.is_empty());
        assert_eq!(client.floor(), 4);
        assert_eq!(client.opponent(), None);
    }

    #[test]
    fn test_make_move_outside_choosing_sends_nothing() {
        let mut client = connected_client("alice");
        assert_eq!(client.make_move("rock"), Err(CommandError::OutOfTurn));

        client.request_match().unwrap();
        client.handle_server(ServerWsMessage::MatchFound { opponent: "bob".to_string() });
        // AwaitingAcceptance: still not our turn to move.
        assert_eq!(client.make_move("rock"), Err(CommandError::OutOfTurn));
    }

    #[test]
    fn test_make_move_validates_choice_locally() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");

        let err = client.make_move("lizard").unwrap_err();
        assert_eq!(err, CommandError::InvalidMove("lizard".to_string()));
        // Failing fast leaves the round intact.
        assert_eq!(client.phase(), DuelPhase::Choosing);

        let effects = client.make_move("rock").unwrap();
        assert_eq!(
            sent_messages(&effects),
            vec![&ClientWsMessage::make_move("alice", Move::Rock)]
        );
        assert_eq!(client.phase(), DuelPhase::AwaitingOpponentChoice);
    }

    #[test]
    fn test_accept_match_outside_proposal_fails() {
        let mut client = connected_client("alice");
        assert_eq!(client.accept_match(), Err(CommandError::OutOfTurn));
    }

    #[test]
    fn test_start_game_requires_local_acceptance() {
        let mut client = connected_client("alice");
        client.request_match().unwrap();
        client.handle_server(ServerWsMessage::MatchFound { opponent: "bob".to_string() });

        // start_game before the local accept is ignored.
        let effects = client.handle_server(ServerWsMessage::StartGame { message: "go".to_string() });
        assert!(effects.is_empty());
        assert_eq!(client.phase(), DuelPhase::AwaitingAcceptance);
    }

    #[test]
    fn test_scenario_match_found_before_timeout() {
        let mut client = connected_client("alice");
        let effects = client.request_match().unwrap();
        let token = scheduled_token(&effects).unwrap();

        client.handle_server(ServerWsMessage::MatchFound { opponent: "bob".to_string() });
        assert_eq!(client.phase(), DuelPhase::AwaitingAcceptance);
        assert_eq!(client.opponent(), Some("bob"));

        // The "no opponent found" branch never renders.
        let late = client.handle_search_timeout(token);
        assert!(rendered_text(&late, Region::Status).is_empty());
    }

    #[test]
    fn test_scenario_winning_round_updates_floor_and_re_enables_search() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");
        client.make_move("rock").unwrap();

        let effects = client.handle_server(ServerWsMessage::GameResult {
            your_move: Move::Rock,
            opponent_move: Move::Scissors,
            result: Outcome::Win,
            new_floor: 4,
        });

        let status = rendered_text(&effects, Region::Status);
        assert!(status.iter().any(|t| t.contains("You win!")));
        assert!(status.iter().any(|t| t.contains("bob")));
        assert_eq!(rendered_text(&effects, Region::FloorInfo), vec!["Floor: 4"]);
        assert!(effects.contains(&Effect::SetSearchEnabled(true)));
        assert_eq!(client.floor(), 4);
        assert_eq!(client.opponent(), None);
        assert_eq!(client.phase(), DuelPhase::Idle);
    }

    #[test]
    fn test_reconnect_re_announces_identity() {
        let mut client = connected_client("alice");
        let effects = client.handle_connection(ConnectionEvent::Closed);
        assert!(!client.is_connected());
        assert!(!rendered_text(&effects, Region::Status).is_empty());

        // The close frame and the stream ending both report Closed; the
        // second report is a no-op.
        assert!(client.handle_connection(ConnectionEvent::Closed).is_empty());

        let effects = client.handle_connection(ConnectionEvent::Opened);
        assert_eq!(
            sent_messages(&effects),
            vec![&ClientWsMessage::register_user("alice")]
        );
    }

    #[test]
    fn test_first_connect_without_identity_sends_nothing() {
        let mut client = DuelClient::new(MatchErrorPolicy::ClearSession);
        let effects = client.handle_connection(ConnectionEvent::Opened);
        assert!(sent_messages(&effects).is_empty());
    }

    #[test]
    fn test_disconnect_leaves_search_and_session_untouched() {
        let mut client = connected_client("alice");
        client.request_match().unwrap();
        client.handle_connection(ConnectionEvent::Closed);
        // No reconnection-time reconciliation: local state stays as it was.
        assert!(client.is_searching());
    }

    #[test]
    fn test_match_error_clear_session_policy() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");

        let effects =
            client.handle_server(ServerWsMessage::MatchError { error: "room vanished".to_string() });
        assert!(rendered_text(&effects, Region::Status)
            .iter()
            .any(|t| t.contains("room vanished")));
        assert!(effects.contains(&Effect::SetSearchEnabled(true)));
        assert_eq!(client.opponent(), None);
        assert_eq!(client.phase(), DuelPhase::Idle);
    }

    #[test]
    fn test_match_error_retain_session_policy() {
        let mut client = DuelClient::new(MatchErrorPolicy::RetainSession);
        client.establish_identity("alice", 1);
        client.handle_connection(ConnectionEvent::Opened);
        start_round(&mut client, "bob");

        let effects =
            client.handle_server(ServerWsMessage::MatchError { error: "room vanished".to_string() });
        assert!(rendered_text(&effects, Region::Status)
            .iter()
            .any(|t| t.contains("room vanished")));
        // Session retained: the round may still be resumed by the server.
        assert_eq!(client.opponent(), Some("bob"));
        assert_eq!(client.phase(), DuelPhase::Choosing);
        assert_eq!(client.request_match(), Err(CommandError::AlreadyInMatch));
    }

    #[test]
    fn test_unsolicited_match_found_during_round_is_ignored() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");

        let effects =
            client.handle_server(ServerWsMessage::MatchFound { opponent: "mallory".to_string() });
        assert!(effects.is_empty());
        assert_eq!(client.opponent(), Some("bob"));
    }

    #[test]
    fn test_waiting_messages_are_rendered_verbatim() {
        let mut client = connected_client("alice");
        client.request_match().unwrap();
        let effects = client.handle_server(ServerWsMessage::Waiting {
            message: "Waiting for an opponent...".to_string(),
        });
        assert_eq!(
            rendered_text(&effects, Region::Status),
            vec!["Waiting for an opponent..."]
        );
    }

    #[test]
    fn test_client_message_wire_shape() {
        let msg = ClientWsMessage::make_move("alice", Move::Rock);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "make_move", "data": {"username": "alice", "move": "rock"}})
        );
        let msg = ClientWsMessage::find_match("alice");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "find_match", "data": {"username": "alice"}})
        );
    }

    #[test]
    fn test_server_message_wire_shape() {
        let frame = r#"{
            "event": "game_result",
            "data": {"your_move": "rock", "opponent_move": "scissors",
                     "result": "win", "new_floor": 4}
        }"#;
        let msg: ServerWsMessage = serde_json::from_str(frame).unwrap();
        assert_eq!(
            msg,
            ServerWsMessage::GameResult {
                your_move: Move::Rock,
                opponent_move: Move::Scissors,
                result: Outcome::Win,
                new_floor: 4,
            }
        );
    }

    #[test]
    fn test_move_parsing() {
        assert_eq!(Move::parse(" Rock "), Some(Move::Rock));
        assert_eq!(Move::parse("scissors"), Some(Move::Scissors));
        assert_eq!(Move::parse("lizard"), None);
        assert_eq!(Move::parse(""), None);
    }

    #[test]
    fn test_reset_tears_the_session_down() {
        let mut client = connected_client("alice");
        start_round(&mut client, "bob");
        client.reset();
        assert_eq!(client.identity(), None);
        assert_eq!(client.opponent(), None);
        assert_eq!(client.phase(), DuelPhase::Idle);
        assert!(!client.is_searching());
        assert_eq!(client.request_match(), Err(CommandError::NotAuthenticated));
    }
}
