pub mod applications;
pub mod companies;
pub mod contracts;
pub mod conversations;
pub mod evaluations;
pub mod freelances;
pub mod invitations;
pub mod notifications;
pub mod projects;
pub mod user_notifications;
