/// Client endpoint configuration constants.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// WebSocket endpoint for the duel event channel.
pub const WS_PATH: &str = "/ws/duel";

/// HTTP endpoints for the auth and lobby collaborators.
pub const REGISTER_PATH: &str = "/register";
pub const LOGIN_PATH: &str = "/login";
pub const LEADERBOARD_PATH: &str = "/leaderboard";
pub const ACTIVE_USERS_PATH: &str = "/active_users";
