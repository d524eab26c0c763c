//! Client-side validation for every form that submits to the backend.
//! A form is turned into its request payload only when it validates.

use crate::api::types::{
    BetRecord, BetStatus, ChangePasswordRequest, NewUserBet, RegisterRequest, ResetPasswordConfirm,
    UpdateProfileRequest, User,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("A odd deve ser maior que zero")]
    NonPositiveOdd,
    #[error("A stake deve ser maior que zero")]
    NonPositiveStake,
    #[error("A meta deve ser maior que zero")]
    NonPositiveTarget,
    #[error("As senhas não coincidem")]
    PasswordMismatch,
    #[error("A senha não pode ser vazia")]
    EmptyPassword,
    #[error("O campo {0} é obrigatório")]
    MissingField(&'static str),
    #[error("O campo {0} não pode ser negativo")]
    Negative(&'static str),
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

fn positive(value: f64, err: ValidationError) -> Result<f64, ValidationError> {
    // NaN fails too.
    if value > 0.0 {
        Ok(value)
    } else {
        Err(err)
    }
}

fn non_negative(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !(v >= 0.0) => Err(ValidationError::Negative(field)),
        other => Ok(other),
    }
}

fn new_password(password: &str, confirm: &str) -> Result<String, ValidationError> {
    if password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(password.to_string())
}

/// "Add to my bets" form, opened from a history or category row.
#[derive(Debug, Clone, PartialEq)]
pub struct AddBetForm {
    pub bet_id: String,
    pub player_name: String,
    pub category: String,
    pub odd: f64,
    /// `None` uses the user's default stake.
    pub stake: Option<f64>,
    pub meta: f64,
}

impl AddBetForm {
    /// Prefilled from a bet row: the meta starts at the bet's target and the
    /// odd at the quoted odds.
    pub fn for_bet(bet: &BetRecord) -> Self {
        Self {
            bet_id: bet.id.clone(),
            player_name: bet.player_name.clone(),
            category: bet.category.clone(),
            odd: bet.odds,
            stake: None,
            meta: bet.target,
        }
    }

    pub fn effective_stake(&self, user: &User) -> f64 {
        self.stake.or(user.default_stake).unwrap_or(0.0)
    }

    pub fn into_request(self, user: &User, now: DateTime<Utc>) -> Result<NewUserBet, ValidationError> {
        let stake = self.effective_stake(user);
        let odd = positive(self.odd, ValidationError::NonPositiveOdd)?;
        let stake = positive(stake, ValidationError::NonPositiveStake)?;
        let meta = positive(self.meta, ValidationError::NonPositiveTarget)?;

        Ok(NewUserBet {
            id: String::new(),
            user_id: user.id.clone(),
            bet_title: format!("{} - {}", self.player_name, self.category),
            bet_id: self.bet_id,
            odd,
            stake,
            meta,
            date: now,
            status: BetStatus::Pending,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn into_request(self) -> Result<ChangePasswordRequest, ValidationError> {
        if self.current_password.is_empty() {
            return Err(ValidationError::MissingField("senha atual"));
        }
        let new_password = new_password(&self.new_password, &self.confirm_password)?;
        Ok(ChangePasswordRequest {
            current_password: self.current_password,
            new_password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn into_request(self) -> Result<RegisterRequest, ValidationError> {
        let full_name = required(&self.full_name, "nome completo")?;
        let email = required(&self.email, "email")?;
        let password = new_password(&self.password, &self.confirm_password)?;
        Ok(RegisterRequest {
            full_name,
            email,
            confirm_password: password.clone(),
            password,
        })
    }
}

/// Second step of password recovery: the token from the e-mail plus the new
/// password typed twice.
#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn into_request(self) -> Result<ResetPasswordConfirm, ValidationError> {
        let token = required(&self.token, "token")?;
        let new_password = new_password(&self.new_password, &self.confirm_password)?;
        Ok(ResetPasswordConfirm { token, new_password })
    }
}

/// Profile edit. Password fields are only checked when a new password is
/// being set.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub email: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
    pub default_stake: Option<f64>,
    pub balance: Option<f64>,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            default_stake: user.default_stake,
            balance: Some(user.balance),
            ..Default::default()
        }
    }

    pub fn into_request(self) -> Result<UpdateProfileRequest, ValidationError> {
        let full_name = required(&self.full_name, "nome completo")?;
        let email = required(&self.email, "email")?;
        let default_stake = non_negative(self.default_stake, "stake padrão")?;
        let balance = non_negative(self.balance, "saldo")?;

        let wants_change = self.new_password.as_deref().is_some_and(|p| !p.is_empty());
        let (current_password, new_password_value) = if wants_change {
            let current = self
                .current_password
                .filter(|p| !p.is_empty())
                .ok_or(ValidationError::MissingField("senha atual"))?;
            let new = new_password(
                self.new_password.as_deref().unwrap_or_default(),
                self.confirm_password.as_deref().unwrap_or_default(),
            )?;
            (Some(current), Some(new))
        } else {
            (None, None)
        };

        Ok(UpdateProfileRequest {
            full_name,
            email,
            current_password,
            new_password: new_password_value,
            default_stake,
            balance,
        })
    }
}
