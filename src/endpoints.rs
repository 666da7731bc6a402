//! The API endpoint URIs.
//!
//! For endpoints that take an id parameter, e.g., '/api/v1/incomes/{id}', use
//! [format_endpoint].

/// The health check route.
pub const HEALTH: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/v1/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/v1/auth/login";
/// The route to list and create incomes.
pub const INCOMES: &str = "/api/v1/incomes";
/// The route to get, update, or delete a single income.
pub const INCOME: &str = "/api/v1/incomes/{id}";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/v1/expenses";
/// The route to get, update, or delete a single expense.
pub const EXPENSE: &str = "/api/v1/expenses/{id}";

/// Replace the `{id}` parameter in `endpoint_path` with `id`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    endpoint_path.replace("{id}", &id.to_string())
}
