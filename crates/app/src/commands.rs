//! Subcommand implementations over a file-backed browser profile.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sessiongate_application::SessionGuard;
use sessiongate_application::ports::{Clock, CookieStore};
use sessiongate_domain::{Cookie, PageLoadOutcome, SessionConfig, StorageKey};
use sessiongate_infrastructure::{
    FileCookieStore, FileStorage, HttpAuthorizer, HttpTokenIssuer, SystemClock, TokioFileSystem,
    load_config, resolve_data_dir,
};
use tracing::{error, info};

type CommandResult = Result<(), Box<dyn Error>>;

/// Prints the local storage key of `root_path`.
pub fn print_key(root_path: &str) {
    println!("{}", StorageKey::access_token(root_path));
}

/// Guard and profile wired for one invocation.
pub struct Runtime {
    guard: SessionGuard,
    cookies: Arc<dyn CookieStore>,
    clock: Arc<dyn Clock>,
}

impl Runtime {
    /// Loads the configuration and opens the profile directory.
    pub fn open(
        config_path: Option<&Path>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, Box<dyn Error>> {
        let mut config: SessionConfig = load_config(config_path)?;
        if data_dir.is_some() {
            config.data_dir = data_dir;
        }
        let profile = resolve_data_dir(&config)?;
        info!(profile = %profile.display(), root = %config.root_path, "opening profile");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let storage = Arc::new(FileStorage::new(TokioFileSystem::new(), &profile));
        let cookies: Arc<dyn CookieStore> = Arc::new(FileCookieStore::new(
            TokioFileSystem::new(),
            &profile,
            clock.clone(),
        ));
        let issuer = Arc::new(HttpTokenIssuer::new(&config, clock.clone())?);
        let authorizer = Arc::new(HttpAuthorizer::new(&config)?);
        let guard = SessionGuard::new(
            config,
            storage,
            cookies.clone(),
            issuer,
            authorizer,
            clock.clone(),
        )?;

        Ok(Self {
            guard,
            cookies,
            clock,
        })
    }

    pub async fn load(&self, path: Option<&str>) -> CommandResult {
        let requested = path.unwrap_or_else(|| self.guard.config().normalized_root());
        match self.guard.on_page_load(requested).await {
            Ok(PageLoadOutcome::Proceed { path, token }) => {
                println!("proceed {path}");
                println!("token {} valid until {}", token.preview(), token.expiry.to_rfc3339());
            }
            Ok(PageLoadOutcome::Reauthorized { path, token }) => {
                println!("reauthorized {path}");
                println!("token {} valid until {}", token.preview(), token.expiry.to_rfc3339());
            }
            Ok(PageLoadOutcome::RedirectToLogin { location }) => {
                println!("redirect {location}");
            }
            Err(e) => {
                error!(error = %e, path = %requested, "page load failed");
                eprintln!("Something went wrong. Reload the page or log in again.");
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub async fn status(&self) -> CommandResult {
        let status = self.guard.status().await?;
        println!("{}: {}", self.guard.storage_key(), status.display_message());
        Ok(())
    }

    pub async fn clear(&self) -> CommandResult {
        self.guard.clear_token().await?;
        println!("cleared {}", self.guard.storage_key());
        Ok(())
    }

    pub async fn logout(&self) -> CommandResult {
        self.guard.logout().await?;
        println!("logged out");
        Ok(())
    }

    pub async fn callback(&self, code: &str, state: &str) -> CommandResult {
        let next = self.guard.complete_authorization(code, state).await?;
        println!("session established, continue at {next}");
        Ok(())
    }

    pub async fn set_cookie(&self, header: &str, account: bool) -> CommandResult {
        let now = self.clock.now();
        let config = self.guard.config();
        let host = if account {
            config.account_host()
        } else {
            config.console_host()
        };
        let cookie = Cookie::from_set_cookie(header, host, now)
            .ok_or("invalid Set-Cookie header")?;
        let name = cookie.name.clone();
        self.cookies.set_cookie(cookie, now).await?;
        println!("stored cookie {name}");
        Ok(())
    }
}
