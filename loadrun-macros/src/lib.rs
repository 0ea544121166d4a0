use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{FnArg, Ident, ItemFn, Pat};

/// Proc macro to denote a Transaction
///
/// Times the call and records its outcome: `Ok` counts as a success, `Err` as a failed
/// transaction.
///
/// NOTE: Only works on `async` functions with a `Result<T, E>` return value.
///
/// # Example
/// ```ignore
/// use loadrun::prelude::*;
///
/// #[transaction]
/// async fn my_transaction(arg_1: u32, arg_2: &str) -> Result<String, MyError> {
///     ...
/// }
/// ```
#[proc_macro_attribute]
pub fn transaction(attr: TokenStream, item: TokenStream) -> TokenStream {
    transaction_internal(attr, item).into()
}

fn transaction_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(sig.fn_token, "#[transaction] requires an async fn")
            .to_compile_error();
    }

    let name = &sig.ident;
    let stmts = &block.stmts;

    quote! {
        #(#attrs)* #vis #sig {
            ::loadrun::transaction::transaction_hook(::loadrun::core::generate_labels!(#name), async move {
                #(#stmts)*
            }).await
        }
    }
}

/// Proc macro to denote a Scenario
///
/// The function becomes the body of one iteration. Its arguments are captured when the scenario
/// is built and cloned into every iteration, so they must implement `Clone + Send + Sync`
/// (wrap shared state in an `Arc`).
///
/// See the `Scenario` struct for more information on the methods this macro provides on functions.
///
/// # Example
/// ```ignore
/// use loadrun::prelude::*;
///
/// #[scenario]
/// async fn my_scenario(session: Arc<Session>) {
/// }
///
/// let stats = my_scenario(session).vus(10).iterations(100).await?;
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr, item).into()
}

fn scenario_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;

    let mut args = vec![];
    for input in &sig.inputs {
        match input {
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => args.push(pat_ident.ident.clone()),
                other => {
                    return syn::Error::new_spanned(
                        other,
                        "#[scenario] arguments must be plain identifiers",
                    )
                    .to_compile_error()
                }
            },
            FnArg::Receiver(receiver) => {
                return syn::Error::new_spanned(receiver, "#[scenario] cannot be used on methods")
                    .to_compile_error()
            }
        }
    }

    let new_name = Ident::new(&format!("__loadrun_{}", sig.ident), Span::call_site());
    let mut new_sig = sig.clone();
    new_sig.ident = new_name.clone();

    let scen_name = sig.ident.clone();
    let mut scen_sig = sig.clone();
    scen_sig.asyncness = None;
    scen_sig.output = syn::parse_quote! {
        -> impl ::loadrun::scenario::ConfigurableScenario<::loadrun::scenario::RunResult>
    };

    quote! {
        #(#attrs)* #vis #scen_sig {
            ::loadrun::scenario::Scenario::new(stringify!(#scen_name), move || {
                #( let #args = ::std::clone::Clone::clone(&#args); )*
                #new_name(#(#args),*)
            })
        }

        #[doc(hidden)]
        #(#attrs)* #vis #new_sig {
            #(#stmts)*
        }
    }
}
