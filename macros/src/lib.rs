use proc_macro::TokenStream;

mod pat;

/// Dispatches a tag with match-arm syntax.
///
/// ```rust,ignore
/// match_tag!(counter, tag {
///     Inc(n) => total + n,
///     Dec(n) => total - n,
///     "reset" => 0,
///     _ => total,
/// })
/// ```
///
/// Each arm becomes an entry of a `tunion::HandlerTable` and `_` becomes its
/// catch-all; the expansion evaluates to the `UnionResult` of
/// `Methods::match_tag`, so exhaustiveness is still checked at run time.
/// Arm bodies run inside closures: `return` and `?` apply to the arm, not to
/// the enclosing function.
#[proc_macro]
pub fn match_tag(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as pat::TagMatch);
    pat::expand_match(input).into()
}
