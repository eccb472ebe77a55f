use moments_core::auth::{AuthClient, SessionPersistence};
use moments_core::models::AccessToken;

use crate::commands::common::{demo_identity, CliContext};
use crate::error::CliError;

pub async fn run_login(
    token_flag: Option<String>,
    remember: bool,
    context: &CliContext,
) -> Result<(), CliError> {
    let identity = if context.demo {
        demo_identity()
    } else {
        let token = match token_flag
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
        {
            Some(raw) => AccessToken::new(raw),
            None => context.resolve_token()?,
        };
        AuthClient::new()?.fetch_identity(&token).await?
    };

    if remember {
        context.session_store()?.save(&identity.to_stored())?;
    }

    let remembered = if remember { " (identity remembered)" } else { "" };
    println!("Signed in as {} <{}>{remembered}", identity.name, identity.email);
    Ok(())
}

pub fn run_logout(context: &CliContext) -> Result<(), CliError> {
    context.session_store()?.clear()?;
    println!("Signed out");
    Ok(())
}

pub fn run_whoami(as_json: bool, context: &CliContext) -> Result<(), CliError> {
    let stored = match context.session_store()?.load()? {
        Some(stored) => stored,
        None if context.demo => demo_identity().to_stored(),
        None => {
            println!("Not signed in.");
            return Ok(());
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
    } else {
        println!("{} <{}>", stored.name, stored.email);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_context() -> (tempfile::TempDir, CliContext) {
        let dir = tempfile::tempdir().unwrap();
        let context = CliContext {
            demo: true,
            store_path: dir.path().join("state.json"),
        };
        (dir, context)
    }

    #[tokio::test]
    async fn demo_login_with_remember_persists_identity() {
        let (_dir, context) = demo_context();

        run_login(None, true, &context).await.unwrap();

        let stored = context.session_store().unwrap().load().unwrap().unwrap();
        assert_eq!(stored.email, "demo@localhost");
    }

    #[tokio::test]
    async fn demo_login_without_remember_persists_nothing() {
        let (_dir, context) = demo_context();

        run_login(None, false, &context).await.unwrap();

        assert!(context.session_store().unwrap().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_the_remembered_identity() {
        let (_dir, context) = demo_context();
        run_login(None, true, &context).await.unwrap();

        run_logout(&context).unwrap();

        assert!(context.session_store().unwrap().load().unwrap().is_none());
    }

    #[test]
    fn whoami_tolerates_no_session() {
        let (_dir, context) = demo_context();
        run_whoami(false, &context).unwrap();
        run_whoami(true, &context).unwrap();
    }
}
