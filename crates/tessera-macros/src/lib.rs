use std::env;

use pattern::Pattern;
use proc_macro2::Span;
use proc_macro_crate::{crate_name, FoundCrate};
use syn::{parse_macro_input, Ident};

mod pattern;

pub(crate) fn crate_root() -> Ident {
    Ident::new(
        &if env::var("CARGO_PKG_NAME").unwrap() == "tessera" {
            String::from("tessera")
        } else if let FoundCrate::Name(root_name) =
            crate_name("tessera").expect("proc-macro-crate could not detect tessera")
        {
            root_name
        } else {
            unreachable!()
        },
        Span::call_site(),
    )
}

/// Builds a `Conjunction` from Graql-like statements.
///
/// Statements are separated by `;` and their properties by `,`. Variables are written as
/// lifetimes, `'x`, with `'_` standing for a fresh anonymous variable. Labels are identifiers, or
/// string literals when they are not valid identifiers.
///
/// ```ignore
/// pattern! {
///     'x isa person, has name "Alice";
///     (friend1: 'x, friend2: 'y) isa friendship;
///     'y has age 'a;
///     'a > 30;
/// }
/// ```
#[proc_macro]
pub fn pattern(tokens: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(tokens as Pattern);

    proc_macro::TokenStream::from(input.construct(&crate_root()))
}
