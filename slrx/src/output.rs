// Renders a serialized table as Rust source, so that a build script can compile the grammar once
// and embed the result as a `static`.  The runtime reads it with `TableWrapper::new(&NAME)`.

use log::debug;
use proc_macro2::{Literal, Span, TokenStream};
use quote::quote;
use slrx_runtime::{TableBuffer, TableWord};
use syn::Ident;

/// Emits `pub static NAME: [W; N] = [...];`.  Fails if `name` is not a valid identifier.
pub fn table_to_tokens<W: TableWord>(name: &str, table: &TableBuffer<W>) -> syn::Result<TokenStream> {
    let name: Ident = syn::parse_str(name)?;
    let word_ty = Ident::new(W::TYPE_NAME, Span::call_site());
    let len = Literal::usize_unsuffixed(table.len());
    let values: Vec<Literal> = table
        .words()
        .iter()
        .map(|w| Literal::u64_unsuffixed(w.to_usize() as u64))
        .collect();
    debug!("emitting {} as [{}; {}]", name, W::TYPE_NAME, table.len());
    Ok(quote! {
        pub static #name: [#word_ty; #len] = [
            #(
                #values
            ),*
        ];
    })
}

/// Like [`table_to_tokens`], rendered to a string ready to be written to `OUT_DIR`.
pub fn table_to_source<W: TableWord>(name: &str, table: &TableBuffer<W>) -> syn::Result<String> {
    Ok(table_to_tokens(name, table)?.to_string())
}
