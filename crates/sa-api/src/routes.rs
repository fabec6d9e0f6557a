//! API routes

use axum::{
    routing::get,
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{files, staff, students, users};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api", api_router())
        .route("/uploads/*path", get(files::download))
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/staff", staff_router())
        .nest("/students", students_router())
        // singular path used by existing clients
        .nest("/student", students_router())
        .nest("/users", users_router())
}

fn staff_router() -> Router<AppState> {
    Router::new()
        .route("/", get(staff::list_staff).post(staff::create_staff))
        .route(
            "/:id",
            get(staff::get_staff)
                .put(staff::update_staff)
                .delete(staff::delete_staff),
        )
}

fn students_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
}

fn users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
}
