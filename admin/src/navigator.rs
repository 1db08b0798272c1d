use std::fmt;

use catalog_common::product::ProductId;

/// Screens of the admin app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    ProductList,
    ProductDetail { id: ProductId },
    AddProduct,
    EditProduct { id: ProductId },
    SignIn,
    Register,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => f.write_str("/admin/dashboard"),
            Route::ProductList => f.write_str("/admin/products"),
            Route::ProductDetail { id } => write!(f, "/admin/products/{id}"),
            Route::AddProduct => f.write_str("/admin/add-product"),
            Route::EditProduct { id } => write!(f, "/admin/add-product/{id}"),
            Route::SignIn => f.write_str("/auth/sign-in"),
            Route::Register => f.write_str("/auth/register"),
        }
    }
}

/// Moves the user between screens. Fire and forget.
pub trait Navigator {
    fn go_to(&self, destination: Route);
}

/// Navigator for headless use: records the transition in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go_to(&self, destination: Route) {
        tracing::info!(%destination, "navigate");
    }
}
