use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::session::{self, CurrentUser};
use crate::user_models::Platform;
use crate::{auth, history, uploads, views, wishlist, AppState};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkForm {
    pub emotion: Option<String>,
    pub platform: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current: Option<String>,
    pub new: Option<String>,
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingField(name))
}

fn back_to_login() -> Response {
    Redirect::to("/login").into_response()
}

pub async fn index() -> Html<String> {
    Html(views::index_page())
}

pub async fn register_form() -> Html<String> {
    Html(views::register_page())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect> {
    let username = required(form.username, "username")?;
    let password = required(form.password, "password")?;

    auth::register(&state.storage, &username, &password, state.config.bcrypt_cost).await?;
    Ok(Redirect::to("/login"))
}

pub async fn login_form() -> Html<String> {
    Html(views::login_page(None))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    match auth::authenticate(&state.storage, &username, &password).await {
        Ok(username) => {
            let token = state.sessions.create(&username).await;
            info!("{} logged in", username);
            Ok((
                [(header::SET_COOKIE, session::session_cookie(&token))],
                Redirect::to("/dashboard"),
            )
                .into_response())
        }
        Err(e @ AppError::InvalidCredentials) => {
            warn!("Failed login for {:?}", username);
            Ok((
                StatusCode::UNAUTHORIZED,
                Html(views::login_page(Some(&e.user_message()))),
            )
                .into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn dashboard(State(state): State<Arc<AppState>>, user: CurrentUser) -> Response {
    match state.storage.get(&user.username).await {
        Some(record) => Html(views::dashboard_page(&user.username, &record.wishlist)).into_response(),
        None => back_to_login(),
    }
}

/// Saves the link and renders the dashboard again in place.
pub async fn add_link(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<LinkForm>,
) -> Result<Response> {
    let emotion = form.emotion.unwrap_or_default();
    let platform = form.platform.unwrap_or_default();
    let link = form.link.unwrap_or_default();

    let updated = state
        .storage
        .update(&user.username, |record| {
            if wishlist::add_link(record, &emotion, &platform, &link) {
                info!("{} mapped {}/{} to {}", user.username, emotion, platform, link);
            }
            record.wishlist.clone()
        })
        .await?;

    Ok(match updated {
        Some(wishlist) => Html(views::dashboard_page(&user.username, &wishlist)).into_response(),
        None => back_to_login(),
    })
}

pub async fn detect_form(_user: CurrentUser) -> Html<String> {
    Html(views::detect_page())
}

struct DetectUpload {
    platform: Option<String>,
    file_name: Option<String>,
    image: Vec<u8>,
}

async fn read_detect_upload(mut multipart: Multipart) -> Result<DetectUpload> {
    let mut upload = DetectUpload {
        platform: None,
        file_name: None,
        image: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("platform") => {
                upload.platform = Some(field.text().await.map_err(|e| AppError::Upload(e.to_string()))?);
            }
            Some("image") => {
                upload.file_name = field.file_name().map(str::to_owned);
                upload.image = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?
                    .to_vec();
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Classifies the uploaded photo and sends the user to the link saved for the
/// detected emotion on the chosen platform.
pub async fn detect(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Response> {
    let upload = read_detect_upload(multipart).await?;

    let platform_name = required(upload.platform, "platform")?;
    let platform: Platform = platform_name.parse().map_err(AppError::UnsupportedPlatform)?;

    let path = uploads::store(&state.config.upload_dir, upload.file_name.as_deref(), &upload.image).await?;

    let emotion = state
        .classifier
        .classify(&path)
        .await
        .map_err(|source| AppError::Classification {
            source,
            expose: state.config.expose_classifier_errors,
        })?;

    // A stored link that cannot be a redirect target is refused before any
    // history is written.
    let outcome = state
        .storage
        .update(&user.username, |record| -> Result<Option<Url>> {
            let link = wishlist::resolve_link(record, &emotion, platform.as_str()).map(str::to_owned);
            let target = match link.as_deref() {
                Some(link) => Some(wishlist::parse_link(link).ok_or_else(|| AppError::UnusableLink {
                    emotion: emotion.clone(),
                    platform: platform.to_string(),
                })?),
                None => None,
            };
            history::record(record, &emotion, platform.as_str(), link.as_deref());
            Ok(target)
        })
        .await?;

    let Some(outcome) = outcome else {
        return Ok(back_to_login());
    };
    let target = outcome?;

    info!(
        "Detected {} for {} on {} ({})",
        emotion,
        user.username,
        platform,
        target.as_ref().map(|url| url.as_str()).unwrap_or("no link")
    );

    Ok(match target {
        Some(url) => Redirect::to(url.as_str()).into_response(),
        None => Html(views::no_link_page(&emotion, platform.as_str())).into_response(),
    })
}

pub async fn change_password_form(_user: CurrentUser) -> Html<String> {
    Html(views::change_password_page())
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response> {
    let current = form.current.unwrap_or_default();
    let new = required(form.new, "new")?;

    match auth::change_password(&state.storage, &user.username, &current, &new, state.config.bcrypt_cost).await {
        Ok(()) => Ok(Html(views::password_changed_page()).into_response()),
        Err(AppError::InvalidCredentials) => {
            warn!("Rejected password change for {}", user.username);
            Ok((
                StatusCode::UNAUTHORIZED,
                Html(views::message_page("Incorrect current password.")),
            )
                .into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn history(State(state): State<Arc<AppState>>, user: CurrentUser) -> Response {
    match state.storage.get(&user.username).await {
        Some(record) => Html(views::history_page(&record.history)).into_response(),
        None => back_to_login(),
    }
}

/// Works with or without a live session.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session::token_from_headers(&headers) {
        if let Some(username) = state.sessions.remove(&token).await {
            info!("{} logged out", username);
        }
    }

    (
        [(header::SET_COOKIE, session::expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
