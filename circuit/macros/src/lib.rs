//! Conversion derives for the workspace's closed sum types.
//!
//! `Event` and `StateChange` both follow the same convention: every variant
//! is a newtype wrapping a struct of the same name. Both derives therefore
//! share one expansion, parameterized by the wrapping sum type.
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
	parse_macro_input,
	DeriveInput,
	Ident,
};

/// Expands to an `Into<wrapper>` impl lifting the type into the wrapper's
/// variant of the same name.
fn wrap_into_sum_type(input: TokenStream, wrapper: &str) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let name = input.ident;
	let wrapper = Ident::new(wrapper, Span::call_site());

	let expanded = quote! {
		impl Into<#wrapper> for #name {
			fn into(self) -> #wrapper {
				#wrapper::#name(self)
			}
		}
	};

	TokenStream::from(expanded)
}

/// Derives `Into<Event>` for a type named after an `Event` variant.
#[proc_macro_derive(IntoEvent)]
pub fn into_event(input: TokenStream) -> TokenStream {
	wrap_into_sum_type(input, "Event")
}

/// Derives `Into<StateChange>` for a type named after a `StateChange`
/// variant.
#[proc_macro_derive(IntoStateChange)]
pub fn into_state_change(input: TokenStream) -> TokenStream {
	wrap_into_sum_type(input, "StateChange")
}
