mod model;

use proc_macro::TokenStream;

/// Creates two new structs for a model: `CreateX` and `UpdateX`.
///
/// Fields marked with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out
/// of both, since they are assigned by the server. Every other field is copied verbatim
/// (attributes included) into `CreateX`, and wrapped in an `Option` in `UpdateX` so that
/// absent fields keep their stored value.
///
/// A `From<&X> for CreateX` impl is generated as well, which is used to pre-fill
/// an edit form with the current values of a record.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
