//! Router Table
//!
//! Maps URL prefixes to the route modules. Route modules are built by the
//! crates that own them; a module that has not been provided answers 501.

use axum::Router;
use kernel::AppError;

use crate::presentation::fault::route_not_found;

pub const USER_PREFIX: &str = "/api/v1/user";
pub const TEAM_PREFIX: &str = "/api/v1/team";
pub const TOURNAMENT_PREFIX: &str = "/api/v1/admin-tournament";
pub const PLAYER_PREFIX: &str = "/api/v1/admin-user";
pub const WALLET_PREFIX: &str = "/api/v1/wallet";

/// Router for a module whose service is not wired in
pub fn unavailable(module: &'static str) -> Router {
    Router::new().fallback(move || async move {
        AppError::not_implemented(format!("{module} service is not available"))
    })
}

/// One router per mounted prefix
#[derive(Debug)]
pub struct RouterTable {
    /// Routes outside every module prefix, such as `/health`
    root: Router,
    user: Router,
    team: Router,
    tournament: Router,
    player: Router,
    wallet: Router,
}

impl Default for RouterTable {
    fn default() -> Self {
        Self {
            root: Router::new(),
            user: unavailable("User"),
            team: unavailable("Team"),
            tournament: unavailable("Tournament"),
            player: unavailable("Player"),
            wallet: unavailable("Wallet"),
        }
    }
}

impl RouterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge routes mounted at the root
    pub fn root(mut self, router: Router) -> Self {
        self.root = self.root.merge(router);
        self
    }

    pub fn user(mut self, router: Router) -> Self {
        self.user = router;
        self
    }

    pub fn team(mut self, router: Router) -> Self {
        self.team = router;
        self
    }

    pub fn tournament(mut self, router: Router) -> Self {
        self.tournament = router;
        self
    }

    pub fn player(mut self, router: Router) -> Self {
        self.player = router;
        self
    }

    pub fn wallet(mut self, router: Router) -> Self {
        self.wallet = router;
        self
    }

    /// Transform the user router, e.g. to put it behind an extra limiter
    pub fn map_user(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.user = f(self.user);
        self
    }

    /// Mount every module under its prefix; unknown paths are a 404 failure
    pub fn into_router(self) -> Router {
        self.root
            .nest(USER_PREFIX, self.user)
            .nest(TEAM_PREFIX, self.team)
            .nest(TOURNAMENT_PREFIX, self.tournament)
            .nest(PLAYER_PREFIX, self.player)
            .nest(WALLET_PREFIX, self.wallet)
            .fallback(route_not_found)
    }
}
