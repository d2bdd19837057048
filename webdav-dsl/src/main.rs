use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use webdav_dsl::{Credentials, DslConfig, MappedDrive, ResourceRef, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Run { site: Option<String>, drive: bool },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut site = None;
    let mut drive = false;
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--site" => {
                let id = args.next().context("--site needs a site id")?;
                site = Some(id);
            }
            "--drive" => drive = true,
            "--help" | "-h" => return Ok(CliMode::Help),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(CliMode::Run { site, drive })
}

fn credentials_from_env() -> Credentials {
    let username = std::env::var("WEBDAV_USER").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("WEBDAV_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    Credentials::new(username, password)
}

async fn smoke(session: &mut Session, site: Option<&str>) -> anyhow::Result<()> {
    match site {
        Some(id) => {
            session.using_site(id).await?;
        }
        None => {
            session.using_own_user_home()?;
        }
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let mut folder = ResourceRef::folder(format!("webdav-smoke-{stamp}"));
    let mut file = ResourceRef::file_with_content("smoke.txt", "smoke test content");

    session
        .create_folder(&mut folder)
        .await
        .context("creating smoke folder")?
        .assert_that()
        .exists_in_webdav()
        .await?
        .using_resource(&folder)?
        .create_file(&mut file)
        .await
        .context("creating smoke file")?
        .assert_that()
        .content_is("smoke test content")
        .await?;

    session
        .using_resource(&folder)?
        .delete()
        .await
        .context("deleting smoke folder")?
        .assert_that()
        .does_not_exist_in_webdav()
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (site, drive) = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: webdav-smoke [--site <id>] [--drive]");
            println!("  --site <id>   Run inside the site's document library");
            println!("  --drive       Run against the mapped network drive");
            return Ok(());
        }
        CliMode::Run { site, drive } => (site, drive),
    };

    let config = DslConfig::from_env()?;
    let user = credentials_from_env();
    let network_drive = MappedDrive::net_use(&config, user.clone());
    let mut session = Session::authenticate(config, user)
        .context("authenticating smoke user")?
        .with_network_drive(network_drive);
    if drive {
        session.using_network_drive().await?;
    }

    let result = smoke(&mut session, site.as_deref()).await;
    if drive {
        session.unmount_network_drive().await?;
    }
    session.disconnect()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cli_mode_defaults_to_run() {
        let mode = parse_cli_mode(vec!["webdav-smoke".to_string()]).unwrap();
        assert_eq!(
            mode,
            CliMode::Run {
                site: None,
                drive: false
            }
        );
    }

    #[test]
    fn parse_cli_mode_reads_site_and_drive() {
        let args = ["webdav-smoke", "--site", "marketing", "--drive"]
            .into_iter()
            .map(str::to_string);
        let mode = parse_cli_mode(args).unwrap();
        assert_eq!(
            mode,
            CliMode::Run {
                site: Some("marketing".to_string()),
                drive: true
            }
        );
    }

    #[test]
    fn parse_cli_mode_supports_help() {
        let mode =
            parse_cli_mode(vec!["webdav-smoke".to_string(), "--help".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Help);
    }

    #[test]
    fn parse_cli_mode_rejects_dangling_site() {
        assert!(parse_cli_mode(vec!["webdav-smoke".to_string(), "--site".to_string()]).is_err());
    }
}
