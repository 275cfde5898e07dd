use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, Ident, ImplItem, Item, ReturnType, Signature};

use crate::shared::{parse_input_type, webservice_crate, InputType};

pub(crate) fn generate(internal: bool, input: Item) -> syn::Result<TokenStream> {
    let krate = webservice_crate(internal);
    match input {
        Item::Fn(item_fn) => {
            let attrs = &item_fn.attrs;
            let vis = &item_fn.vis;
            let sig = &item_fn.sig;
            let body = &item_fn.block;
            let name = &sig.ident;
            let hfn = handle_call(&krate, sig, false)?;
            Ok(quote! {
                #[allow(non_camel_case_types)]
                #[derive(Debug)]
                #vis struct #name;
                impl #name {
                    #(#attrs)*
                    #sig #body
                }
                #[#krate::async_trait]
                impl #krate::Handler for #name {
                    async fn handle(
                        &self,
                        req: &mut #krate::Request,
                        depot: &mut #krate::Depot,
                        res: &mut #krate::Response,
                        ctrl: &mut #krate::routing::FlowCtrl
                    ) {
                        #hfn
                    }
                }
            })
        }
        Item::Impl(item_impl) => {
            let sig = item_impl
                .items
                .iter()
                .find_map(|item| match item {
                    ImplItem::Method(method) if method.sig.ident == "handle" => Some(&method.sig),
                    _ => None,
                })
                .ok_or_else(|| Error::new_spanned(&item_impl.impl_token, "missing method `handle`"))?;
            let hfn = handle_call(&krate, sig, true)?;
            let ty = &item_impl.self_ty;
            let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();
            Ok(quote! {
                #item_impl
                #[#krate::async_trait]
                impl #impl_generics #krate::Handler for #ty #where_clause {
                    async fn handle(
                        &self,
                        req: &mut #krate::Request,
                        depot: &mut #krate::Depot,
                        res: &mut #krate::Response,
                        ctrl: &mut #krate::routing::FlowCtrl
                    ) {
                        #hfn
                    }
                }
            })
        }
        _ => Err(Error::new_spanned(
            input,
            "#[handler] must be added to `fn` or `impl`",
        )),
    }
}

fn handle_call(krate: &Ident, sig: &Signature, in_impl: bool) -> syn::Result<TokenStream> {
    let mut call_args = Vec::with_capacity(sig.inputs.len());
    let mut has_receiver = false;
    for input in &sig.inputs {
        match parse_input_type(input) {
            InputType::Request(_) => call_args.push(quote!(req)),
            InputType::Depot(_) => call_args.push(quote!(depot)),
            InputType::Response(_) => call_args.push(quote!(res)),
            InputType::FlowCtrl(_) => call_args.push(quote!(ctrl)),
            InputType::Receiver(_) if in_impl => has_receiver = true,
            InputType::Receiver(r) => {
                return Err(Error::new_spanned(r, "receiver is only allowed in `impl` handlers"));
            }
            InputType::NoReference(p) => {
                return Err(Error::new_spanned(p, "handler parameters must be references"));
            }
            InputType::Unknown => {
                return Err(Error::new_spanned(
                    input,
                    "handler parameters must be one of `Request`, `Depot`, `Response` or `FlowCtrl`",
                ));
            }
        }
    }
    let name = &sig.ident;
    let callee = if has_receiver {
        quote!(self.#name)
    } else {
        quote!(Self::#name)
    };
    let awaiting = if sig.asyncness.is_some() {
        quote!(.await)
    } else {
        quote!()
    };
    Ok(match &sig.output {
        ReturnType::Default => quote! {
            #callee(#(#call_args),*)#awaiting;
        },
        ReturnType::Type(..) => quote! {
            #krate::Writer::write(#callee(#(#call_args),*)#awaiting, req, depot, res).await;
        },
    })
}
