//! Derive macros for wiring.
//!
//! This crate provides `#[derive(Component)]`, which implements
//! `wiring::component::Component` by dispatching member names:
//! - fields marked `#[inject]` become property injection targets
//! - methods listed in `#[component(setters(...))]` become method injection targets
//!
//! Generated code references `::wiring`, so the consuming crate must depend on
//! `wiring` (the `wiring` crate itself aliases `extern crate self as wiring`).

use proc_macro::TokenStream;

mod component;

/// Derive macro for types that accept property and method injection.
///
/// # Requirements
///
/// - Only structs with named fields are supported
/// - Each `#[inject]` field type must implement `FromInstance`
///   (`Arc<T>` or `Option<Arc<T>>`)
/// - Each listed setter must have the signature
///   `fn(&mut self, Instance) -> anyhow::Result<()>`
///
/// # Example
///
/// ```ignore
/// use wiring::component::{Component, Instance};
///
/// #[derive(Component)]
/// #[component(setters(set_logger))]
/// pub struct OrderService {
///     #[inject]
///     db: Option<Arc<Database>>,
///     #[inject(rename = "cache")]
///     store: Option<Arc<Cache>>,
/// }
///
/// // Generated implementation:
/// // impl Component for OrderService {
/// //     fn set_property(&mut self, field: &str, value: Instance) -> BindResult {
/// //         match field {
/// //             "db" => { self.db = FromInstance::from_instance(value)?; Ok(()) }
/// //             "cache" => { self.store = FromInstance::from_instance(value)?; Ok(()) }
/// //             _ => Err(unknown_property(..)),
/// //         }
/// //     }
/// //     fn invoke(&mut self, method: &str, value: Instance) -> BindResult {
/// //         match method {
/// //             "set_logger" => self.set_logger(value),
/// //             _ => Err(unknown_method(..)),
/// //         }
/// //     }
/// // }
/// ```
#[proc_macro_derive(Component, attributes(component, inject))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::derive_component_impl(input)
}
