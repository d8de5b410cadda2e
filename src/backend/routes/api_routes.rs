/**
 * API Route Handlers
 *
 * This module defines the routers for the five API groups. Each is nested
 * by `create_router` under its prefix.
 *
 * # Routes
 *
 * ## Users (`/api/users`)
 * - `GET /public`, `GET /leaderboard`, `POST /register`, `POST /login`,
 *   `POST /check-username`, `POST /check-email` - public
 * - `GET /me`, `PUT /profile`, `PUT /password`, `PUT /manage-ally`,
 *   `PUT /leave-ally`, `GET /` - authenticated
 * - `PUT /{id}/role`, `DELETE /{id}` - admin
 *
 * ## Stories (`/api/stories`)
 * - `GET /`, `GET /hot`, `GET /recent`, `GET /search`, `GET /{id}` - public
 * - `GET /me/bookmarks`, `POST /check-title`, `POST /`, `PUT /{id}`,
 *   `DELETE /{id}`, `PUT /{id}/like`, `POST /{id}/rate`, `PUT /{id}/bookmark`,
 *   `PUT /{id}/volumes/{volume_id}/chapters/{chapter_id}/content` - authenticated
 *
 * ## Comments (`/api/comments`)
 * - `GET /` - public
 * - `POST /`, `PUT /{id}/like`, `DELETE /{id}` - authenticated
 * - `PUT /{id}/pin` - admin
 *
 * ## Chats (`/api/chats`), all authenticated
 * - `GET /threads`, `POST /send`, `GET /limit`
 * - `PUT /threads/{other_user_id}/read`
 * - `DELETE /threads/{other_user_id}` - admin
 *
 * ## Settings (`/api/settings`)
 * - `GET /` - public
 * - `PUT /` - admin
 *
 * Admin checks happen in the `AdminUser` extractor; the routers only
 * attach `auth_middleware`.
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::auth::handlers::{
    check_email, check_username, delete_user, leaderboard, leave_ally, list_users, login,
    manage_ally, me, public_users, register, update_password, update_profile, update_role,
};
use crate::backend::comments::handlers::{
    create_comment, delete_comment, list_comments, toggle_comment_like, toggle_comment_pin,
};
use crate::backend::messaging::handlers::{
    delete_conversation, get_message_limit, get_threads, mark_thread_read, send_message,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;
use crate::backend::settings::handlers::{get_settings, update_settings};
use crate::backend::stories::handlers::{
    bookmarked_stories, check_title, create_story, delete_story, get_story, hot_stories,
    list_stories, rate_story, recent_stories, search_stories, toggle_bookmark, toggle_like,
    update_chapter_content, update_story,
};

/// Routes nested under `/api/users`
pub fn user_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/public", get(public_users))
        .route("/leaderboard", get(leaderboard))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/check-username", post(check_username))
        .route("/check-email", post(check_email));

    let protected = Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(update_password))
        .route("/manage-ally", put(manage_ally))
        .route("/leave-ally", put(leave_ally))
        .route("/{id}/role", put(update_role))
        .route("/{id}", delete(delete_user))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected)
}

/// Routes nested under `/api/stories`
///
/// `/` and `/{id}` mix public reads with authenticated writes, so the
/// middleware wraps only the writing handlers there.
pub fn story_routes(state: &AppState) -> Router<AppState> {
    let auth = || from_fn_with_state(state.clone(), auth_middleware);

    let public = Router::new()
        .route("/hot", get(hot_stories))
        .route("/recent", get(recent_stories))
        .route("/search", get(search_stories))
        .route("/", get(list_stories).merge(post(create_story).route_layer(auth())))
        .route(
            "/{id}",
            get(get_story).merge(put(update_story).delete(delete_story).route_layer(auth())),
        );

    let protected = Router::new()
        .route("/me/bookmarks", get(bookmarked_stories))
        .route("/check-title", post(check_title))
        .route("/{id}/like", put(toggle_like))
        .route("/{id}/rate", post(rate_story))
        .route("/{id}/bookmark", put(toggle_bookmark))
        .route(
            "/{id}/volumes/{volume_id}/chapters/{chapter_id}/content",
            put(update_chapter_content),
        )
        .route_layer(auth());

    public.merge(protected)
}

/// Routes nested under `/api/comments`
pub fn comment_routes(state: &AppState) -> Router<AppState> {
    let auth = || from_fn_with_state(state.clone(), auth_middleware);

    let public = Router::new().route(
        "/",
        get(list_comments).merge(post(create_comment).route_layer(auth())),
    );

    let protected = Router::new()
        .route("/{id}/like", put(toggle_comment_like))
        .route("/{id}/pin", put(toggle_comment_pin))
        .route("/{id}", delete(delete_comment))
        .route_layer(auth());

    public.merge(protected)
}

/// Routes nested under `/api/chats`
pub fn chat_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/threads", get(get_threads))
        .route("/send", post(send_message))
        .route("/limit", get(get_message_limit))
        .route("/threads/{other_user_id}/read", put(mark_thread_read))
        .route("/threads/{other_user_id}", delete(delete_conversation))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

/// Routes nested under `/api/settings`
///
/// Reading is public, so the middleware wraps only the `PUT` handler.
pub fn settings_routes(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_settings).merge(
            put(update_settings).route_layer(from_fn_with_state(state.clone(), auth_middleware)),
        ),
    )
}
