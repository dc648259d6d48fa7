use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use crate::modules::bootcamps::model::{Bootcamp, CreateBootcampRequest, UpdateBootcampRequest};
use crate::modules::courses::model::{
    BootcampSummary, Course, CreateCourseRequest, MinimumSkill, UpdateCourseRequest,
};
use crate::modules::users::model::{CreateUserRequest, UpdateUserRequest, User, UserRole};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::update_details,
        crate::modules::auth::controller::update_password,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::bootcamps::controller::get_bootcamps,
        crate::modules::bootcamps::controller::get_bootcamp,
        crate::modules::bootcamps::controller::create_bootcamp,
        crate::modules::bootcamps::controller::update_bootcamp,
        crate::modules::bootcamps::controller::delete_bootcamp,
        crate::modules::bootcamps::controller::get_bootcamps_in_radius,
        crate::modules::bootcamps::controller::upload_bootcamp_photo,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_bootcamp_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
    ),
    components(
        schemas(
            User,
            UserRole,
            CreateUserRequest,
            UpdateUserRequest,
            RegisterRequest,
            LoginRequest,
            UpdateDetailsRequest,
            UpdatePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            TokenResponse,
            Bootcamp,
            CreateBootcampRequest,
            UpdateBootcampRequest,
            Course,
            MinimumSkill,
            BootcampSummary,
            CreateCourseRequest,
            UpdateCourseRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and password management"),
        (name = "Bootcamps", description = "Bootcamp directory endpoints"),
        (name = "Courses", description = "Course endpoints, standalone and nested under bootcamps"),
        (name = "Users", description = "Admin-only user management")
    ),
    info(
        title = "CodeCamp API",
        version = "1.0.0",
        description = "Bootcamp directory REST API built with Rust, Axum, and PostgreSQL featuring JWT-based authentication.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
