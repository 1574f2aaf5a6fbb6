//! Authentication and password endpoints

use crate::api::error::ApiError;
use crate::api::{ApiJson, BearerToken};
use crate::core::traits::AuthService;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-reset-token", post(verify_reset_token))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

const FORGOT_PASSWORD_MESSAGE: &str =
    "Si el email existe, recibirás instrucciones para restablecer tu contraseña";

fn require(fields: &[&str], message: &str) -> Result<(), ApiError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        Err(ApiError::bad_request(message))
    } else {
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

async fn login(
    Inject(auth_service): Inject<dyn AuthService>,
    ApiJson(request): ApiJson<schemas::LoginRequest>,
) -> Result<Json<schemas::LoginResponse>, ApiError> {
    require(
        &[request.email.as_str(), request.password.as_str()],
        "Email y contraseña son requeridos",
    )?;

    if !looks_like_email(&request.email) {
        return Err(ApiError::bad_request("El formato del email no es válido"));
    }

    let outcome = auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(schemas::LoginResponse {
        message: "Login exitoso".to_owned(),
        token: outcome.token,
        usuario: outcome.user.into(),
    }))
}

async fn forgot_password(
    Inject(auth_service): Inject<dyn AuthService>,
    ApiJson(request): ApiJson<schemas::ForgotPasswordRequest>,
) -> Result<Json<schemas::ForgotPasswordResponse>, ApiError> {
    require(&[request.email.as_str()], "El email es requerido")?;

    let token = auth_service.forgot_password(&request.email).await?;

    Ok(Json(schemas::ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_owned(),
        token,
    }))
}

async fn verify_reset_token(
    Inject(auth_service): Inject<dyn AuthService>,
    ApiJson(request): ApiJson<schemas::VerifyResetTokenRequest>,
) -> Result<Json<schemas::VerifyResetTokenResponse>, ApiError> {
    require(&[request.token.as_str()], "El token es requerido")?;

    let email = auth_service.verify_reset_token(&request.token).await?;

    Ok(Json(schemas::VerifyResetTokenResponse {
        message: "Token válido".to_owned(),
        email,
    }))
}

async fn reset_password(
    Inject(auth_service): Inject<dyn AuthService>,
    ApiJson(request): ApiJson<schemas::ResetPasswordRequest>,
) -> Result<Json<schemas::MessageResponse>, ApiError> {
    require(
        &[request.token.as_str(), request.new_password.as_str()],
        "El token y la nueva contraseña son requeridos",
    )?;

    auth_service
        .reset_password(&request.token, &request.new_password)
        .await?;

    Ok(Json(schemas::MessageResponse {
        message: "Contraseña restablecida exitosamente".to_owned(),
    }))
}

async fn change_password(
    Inject(auth_service): Inject<dyn AuthService>,
    ApiJson(request): ApiJson<schemas::ChangePasswordRequest>,
) -> Result<Json<schemas::MessageResponse>, ApiError> {
    require(
        &[
            request.email.as_str(),
            request.current_password.as_str(),
            request.new_password.as_str(),
        ],
        "Email, contraseña actual y nueva contraseña son requeridos",
    )?;

    auth_service
        .change_password(
            &request.email,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(Json(schemas::MessageResponse {
        message: "Contraseña actualizada exitosamente".to_owned(),
    }))
}

async fn me(
    Inject(auth_service): Inject<dyn AuthService>,
    BearerToken(token): BearerToken,
) -> Result<Json<schemas::UserInfo>, ApiError> {
    let user = auth_service.session_user(&token).await?;

    Ok(Json(user.into()))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Serialize, Debug)]
    pub struct LoginResponse {
        pub message: String,
        pub token: String,
        pub usuario: UserInfo,
    }

    /// User projection safe to hand out: no password hash, no reset token.
    #[derive(Serialize, Debug)]
    pub struct UserInfo {
        pub id: Uuid,
        pub email: String,
        #[serde(rename = "nombreCompleto")]
        pub full_name: String,
        #[serde(rename = "nombre")]
        pub first_name: String,
        #[serde(rename = "departamento")]
        pub department: String,
        #[serde(rename = "puesto")]
        pub position: String,
        #[serde(rename = "activo")]
        pub active: bool,
        #[serde(rename = "verificado")]
        pub verified: bool,
        #[serde(rename = "estadoOnboarding")]
        pub onboarding_state: String,
        #[serde(rename = "progresoOnboarding")]
        pub onboarding_progress: i64,
        #[serde(rename = "rol")]
        pub role: String,
    }

    impl From<entities::User> for UserInfo {
        fn from(user: entities::User) -> Self {
            UserInfo {
                id: user.id,
                email: user.email,
                full_name: user.full_name,
                first_name: user.first_name,
                department: user.department,
                position: user.position,
                active: user.active,
                verified: user.verified,
                onboarding_state: user.onboarding_state,
                onboarding_progress: user.onboarding_progress,
                role: user.role,
            }
        }
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct ForgotPasswordRequest {
        pub email: String,
    }

    #[derive(Serialize, Debug)]
    pub struct ForgotPasswordResponse {
        pub message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub token: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct VerifyResetTokenRequest {
        pub token: String,
    }

    #[derive(Serialize, Debug)]
    pub struct VerifyResetTokenResponse {
        pub message: String,
        pub email: String,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default, rename_all = "camelCase")]
    pub struct ResetPasswordRequest {
        pub token: String,
        pub new_password: String,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default, rename_all = "camelCase")]
    pub struct ChangePasswordRequest {
        pub email: String,
        pub current_password: String,
        pub new_password: String,
    }

    #[derive(Serialize, Debug)]
    pub struct MessageResponse {
        pub message: String,
    }
}
