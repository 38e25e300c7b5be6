//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;
use turnstile_core::{LoginForm, NewPasswordForm, RegisterForm, SendEmailForm, Settings};
use turnstile_http::client::request::Method;
use turnstile_http::server;
use turnstile_http::{OutboundRequest, RouteGateConfig, SessionClient};

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the issued credentials
    Login {
        /// Account email
        email: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "TURNSTILE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the issued credentials
    Register {
        /// Account email
        email: String,

        /// Public username
        username: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "TURNSTILE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Password confirmation; defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Revoke the session on the server and forget it locally
    Logout {
        /// Forget the local session even if the server call fails
        #[arg(long)]
        force: bool,
    },

    /// Show whether a session is held
    Status,

    /// Request a password reset email
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Check a password reset token from the email link
    CheckResetToken {
        /// Reset token
        token: String,
    },

    /// Set a new password with a reset token
    ResetPassword {
        /// Reset token
        token: String,

        /// New password; read from stdin when omitted
        #[arg(long, env = "TURNSTILE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Password confirmation; defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Send an authenticated request and print the JSON response
    Request {
        /// HTTP method
        method: String,

        /// Path relative to the API base URL
        path: String,

        /// JSON request body
        #[arg(long)]
        data: Option<String>,

        /// Query parameter as key=value; repeatable
        #[arg(short = 'q', long = "query")]
        query: Vec<String>,
    },

    /// Serve a directory behind the route gate
    Serve {
        /// Directory holding the built site
        #[arg(long)]
        dir: PathBuf,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
    },
}

impl Commands {
    pub async fn execute(self, settings: Settings, data_dir: PathBuf) -> Result<()> {
        let client = || config::build_client(&settings, &data_dir);

        match self {
            Commands::Login { email, password } => {
                let client = client()?;
                let password = password_or_stdin(password, "Password")?;
                let response = client.login(&LoginForm { email, password }).await?;
                report_session(&client, response.user.map(|u| u.username)).await;
            }
            Commands::Register {
                email,
                username,
                password,
                confirm_password,
            } => {
                let client = client()?;
                let password = password_or_stdin(password, "Password")?;
                let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
                let form = RegisterForm {
                    email,
                    username: username.clone(),
                    password,
                    confirm_password,
                };
                client.register(&form).await?;
                report_session(&client, Some(username)).await;
            }
            Commands::Logout { force } => logout(&client()?, force).await?,
            Commands::Status => {
                println!("{}", client()?.state().await);
            }
            Commands::ForgotPassword { email } => {
                let response = client()?.send_reset_email(&SendEmailForm { email }).await?;
                println!("{}", response.message);
            }
            Commands::CheckResetToken { token } => {
                let check = client()?.check_reset_token(&token).await?;
                println!("{}", check.message);
                if let Some(user) = check.user {
                    println!("account: {}", user.email);
                }
            }
            Commands::ResetPassword {
                token,
                password,
                confirm_password,
            } => {
                let password = password_or_stdin(password, "New password")?;
                let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
                let form = NewPasswordForm {
                    token,
                    password,
                    confirm_password,
                };
                let response = client()?.set_new_password(&form).await?;
                println!("{}", response.message);
            }
            Commands::Request {
                method,
                path,
                data,
                query,
            } => {
                let request = build_request(&method, &path, data.as_deref(), &query)?;
                let body: serde_json::Value = client()?.execute(request).await?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Commands::Serve { dir, bind } => serve(&settings, dir, &bind).await?,
        }

        Ok(())
    }
}

async fn report_session(client: &SessionClient, username: Option<String>) {
    let state = client.state().await;
    match username {
        Some(name) if state.is_authenticated() => println!("logged in as {name}"),
        _ => println!("{state}"),
    }
}

async fn logout(client: &SessionClient, force: bool) -> Result<()> {
    match client.logout().await {
        Ok(true) => println!("logged out"),
        Ok(false) if force => {
            client.store().clear().await;
            println!("server did not confirm; local session removed");
        }
        Ok(false) => bail!("server did not confirm logout; use --force to drop the local session"),
        Err(e) if force => {
            client.store().clear().await;
            info!(error = %e, "Logout request failed, cleared local session");
            println!("logout request failed ({e}); local session removed");
        }
        Err(e) => return Err(e).context("logout failed"),
    }
    Ok(())
}

fn build_request(
    method: &str,
    path: &str,
    data: Option<&str>,
    query: &[String],
) -> Result<OutboundRequest> {
    let method: Method = method
        .to_ascii_uppercase()
        .parse()
        .with_context(|| format!("invalid HTTP method: {method}"))?;

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let mut request = OutboundRequest::new(method, path);
    for pair in query {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("query parameter must be key=value: {pair}");
        };
        request = request.query(key, value);
    }

    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.json_value(body);
    }

    Ok(request)
}

fn password_or_stdin(password: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("{prompt}: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn serve(settings: &Settings, dir: PathBuf, bind: &str) -> Result<()> {
    info!("Starting gated site server");
    let gate = RouteGateConfig::from(settings);

    server::serve(bind, dir, gate, async {
        // Ctrl-C failing to install just means we run until killed
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
