use anyhow::{Context, Result};
use basketbet_pro::api::types::Category;
use basketbet_pro::api::BetApi;
use basketbet_pro::app::App;
use basketbet_pro::config::{prompt, Config};
use basketbet_pro::engine::filter::{self, FilterCriteria};
use basketbet_pro::engine::report::{self, format_success_rate, AggregateRow, ReportMode, SortDirection, SortField, SortState};
use basketbet_pro::forms::{AddBetForm, ChangePasswordForm, ProfileForm, RegisterForm, ResetPasswordForm};
use basketbet_pro::logging;
use basketbet_pro::session::SessionContext;
use basketbet_pro::tui::{self, state::AppState};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Parser, Debug)]
#[command(name = "basketbet", version, about = "NBA player-prop betting dashboard")]
struct Cli {
    #[arg(long, env = "BASKETBET_CONFIG", default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard (default)
    Tui,
    /// Log in and save the session locally
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Forget the saved session
    Logout,
    /// Ask for a password reset e-mail
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the token from the reset e-mail
    ConfirmReset {
        #[arg(long)]
        token: String,
    },
    /// Change the logged-in user's password
    ChangePassword,
    /// Update name, e-mail, default stake or balance
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        default_stake: Option<f64>,
        #[arg(long)]
        balance: Option<f64>,
        /// Prompt for a new password as part of the update
        #[arg(long)]
        change_password: bool,
    },
    /// Add a bet to "my bets"
    AddBet {
        #[arg(long)]
        bet_id: String,
        #[arg(long)]
        player: String,
        #[arg(long, default_value = "Points")]
        category: String,
        #[arg(long)]
        odd: f64,
        /// Defaults to the profile's default stake
        #[arg(long)]
        stake: Option<f64>,
        #[arg(long)]
        meta: f64,
    },
    /// Print an aggregate report of the bet history
    Report {
        #[arg(long, default_value = "categoria")]
        mode: ReportMode,
        #[arg(long, default_value = "total")]
        sort: SortField,
        #[arg(long)]
        asc: bool,
        /// Restrict the player report to one player
        #[arg(long)]
        player: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load saved values from .env (real env vars take precedence)
    Config::load_env_file();
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env_overrides();
    logging::init(&config.logging)?;

    let api = Arc::new(BetApi::new(&config.api.base_url, config.api.request_timeout())?);
    let mut session = SessionContext::restore(config.session.file.clone())
        .with_context(|| format!("failed to read session file {}", config.session.file.display()))?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_dashboard(&config, api, session).await,
        Command::Login { email } => {
            let email = match email {
                Some(e) => e,
                None => Config::login_email()?,
            };
            let password = Config::password("Senha", "BASKETBET_PASSWORD")?;
            let s = session.login(&api, &email, &password).await.map_err(user_error)?;
            println!("  Bem-vindo, {}!", s.user.full_name);
            Ok(())
        }
        Command::Register { name, email } => {
            let form = RegisterForm {
                full_name: name,
                email,
                password: prompt("Senha")?,
                confirm_password: prompt("Confirmar senha")?,
            };
            let body = form.into_request()?;
            let s = session.register(&api, &body).await.map_err(user_error)?;
            println!("  Conta criada para {}", s.user.email);
            Ok(())
        }
        Command::Logout => {
            session.logout()?;
            println!("  Sessão encerrada");
            Ok(())
        }
        Command::ResetPassword { email } => {
            api.request_password_reset(&email).await.map_err(user_error)?;
            println!("  Se o e-mail existir, enviaremos instruções de recuperação");
            Ok(())
        }
        Command::ConfirmReset { token } => {
            let form = ResetPasswordForm {
                token,
                new_password: prompt("Nova senha")?,
                confirm_password: prompt("Confirmar nova senha")?,
            };
            let req = form.into_request()?;
            api.confirm_password_reset(&req.token, &req.new_password)
                .await
                .map_err(user_error)?;
            println!("  Senha redefinida");
            Ok(())
        }
        Command::ChangePassword => {
            let s = session.require().map_err(user_error)?;
            let form = ChangePasswordForm {
                current_password: Config::password("Senha atual", "BASKETBET_PASSWORD")?,
                new_password: prompt("Nova senha")?,
                confirm_password: prompt("Confirmar nova senha")?,
            };
            api.change_password(s, &form.into_request()?).await.map_err(user_error)?;
            println!("  Senha alterada");
            Ok(())
        }
        Command::UpdateProfile {
            name,
            email,
            default_stake,
            balance,
            change_password,
        } => {
            let s = session.require().map_err(user_error)?;
            let mut form = ProfileForm::from_user(&s.user);
            if let Some(name) = name {
                form.full_name = name;
            }
            if let Some(email) = email {
                form.email = email;
            }
            if default_stake.is_some() {
                form.default_stake = default_stake;
            }
            if balance.is_some() {
                form.balance = balance;
            }
            if change_password {
                form.current_password = Some(prompt("Senha atual")?);
                form.new_password = Some(prompt("Nova senha")?);
                form.confirm_password = Some(prompt("Confirmar nova senha")?);
            }
            let req = form.into_request()?;
            api.update_profile(s, &req).await.map_err(user_error)?;
            session.update_user(|u| {
                u.full_name = req.full_name.clone();
                u.email = req.email.clone();
                u.default_stake = req.default_stake.or(u.default_stake);
                if let Some(balance) = req.balance {
                    u.balance = balance;
                }
            })?;
            println!("  Perfil atualizado");
            Ok(())
        }
        Command::AddBet {
            bet_id,
            player,
            category,
            odd,
            stake,
            meta,
        } => {
            let s = session.require().map_err(user_error)?;
            let form = AddBetForm {
                bet_id,
                player_name: player,
                category,
                odd,
                stake,
                meta,
            };
            let req = form.into_request(&s.user, chrono::Utc::now())?;
            api.add_user_bet(s, &req).await.map_err(user_error)?;
            println!("  Aposta adicionada: {}", req.bet_title);
            Ok(())
        }
        Command::Report {
            mode,
            sort,
            asc,
            player,
            search,
            category,
            start,
            end,
        } => {
            let criteria = FilterCriteria {
                search_term: search,
                start_date: start,
                end_date: end,
                category,
                status: None,
            };
            let bets = if criteria.has_inverted_range() {
                Vec::new()
            } else {
                api.history(&criteria).await.map_err(user_error)?
            };
            let bets = filter::apply(&bets, &criteria);
            let sort = SortState {
                field: sort,
                direction: if asc { SortDirection::Ascending } else { SortDirection::Descending },
            };
            let rows = report::build_report(&bets, mode, player.as_deref(), &sort);
            print_report(mode, &rows);
            Ok(())
        }
    }
}

async fn run_dashboard(config: &Config, api: Arc<BetApi>, session: SessionContext) -> Result<()> {
    let (state_tx, state_rx) = watch::channel(AppState::new());
    let (cmd_tx, cmd_rx) = mpsc::channel::<tui::TuiCommand>(16);

    let app = App::new(config, api, session, state_tx);
    let controller = tokio::spawn(app.run(cmd_rx));

    // TUI runs in the foreground
    let result = tui::run_tui(state_rx, cmd_tx).await;
    controller.abort();
    result
}

/// Surface the localized message while keeping the full error in the log.
fn user_error(e: basketbet_pro::api::ApiError) -> anyhow::Error {
    tracing::warn!(error = %e, "command failed");
    anyhow::anyhow!(e.user_message())
}

fn print_report(mode: ReportMode, rows: &[AggregateRow]) {
    if rows.is_empty() {
        println!("  Nenhum dado para o relatório");
        return;
    }
    let label = match mode {
        ReportMode::Category => "Categoria",
        ReportMode::Player | ReportMode::Ranking => "Jogador",
    };
    println!(
        "  {:<28} {:>6} {:>8} {:>12} {:>12} {:>9}",
        label, "Total", "Vitórias", "Stake", "Lucro", "Taxa"
    );
    for row in rows {
        let name = match mode {
            ReportMode::Category => {
                let tag = row.category.as_deref().unwrap_or_default();
                Category::from_tag(tag).map_or(tag, |c| c.label()).to_string()
            }
            ReportMode::Player => format!(
                "{} / {}",
                row.player.as_deref().unwrap_or_default(),
                row.category.as_deref().unwrap_or_default()
            ),
            ReportMode::Ranking => row.player.clone().unwrap_or_default(),
        };
        println!(
            "  {:<28} {:>6} {:>8} {:>12.2} {:>12.2} {:>9}",
            name,
            row.total,
            row.wins,
            row.stake_total,
            row.profit_total,
            format_success_rate(row.success_rate(), row.total)
        );
    }
}
