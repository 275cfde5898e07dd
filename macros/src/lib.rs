mod handler;
mod shared;

use proc_macro::TokenStream;
use syn::{parse_macro_input, AttributeArgs, Item};

/// Turns an `fn` or an `impl` block with a `handle` method into a `Handler`.
///
/// Parameters are matched by type name: `Request`, `Depot`, `Response` and
/// `FlowCtrl`, in any order. A return value is written back with `Writer`.
#[proc_macro_attribute]
pub fn handler(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as AttributeArgs);
    let internal = shared::is_internal(args.iter());
    let item = parse_macro_input!(input as Item);
    match handler::generate(internal, item) {
        Ok(stream) => stream.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::parse2;

    use super::*;

    #[test]
    fn test_handler_for_fn() {
        let input = quote! {
            #[handler]
            async fn hello(req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
                res.render("Hello world");
            }
        };
        let item = parse2(input).unwrap();

        let right = quote! {
            #[allow(non_camel_case_types)]
            #[derive(Debug)]
            struct hello;
            impl hello {
                #[handler]
                async fn hello(req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
                    res.render("Hello world");
                }
            }
            #[webservice_t::async_trait]
            impl webservice_t::Handler for hello {
                async fn handle(
                    &self,
                    req: &mut webservice_t::Request,
                    depot: &mut webservice_t::Depot,
                    res: &mut webservice_t::Response,
                    ctrl: &mut webservice_t::routing::FlowCtrl
                ) {
                    Self::hello(req, depot, res, ctrl).await;
                }
            }
        };

        assert_eq!(
            handler::generate(false, item).unwrap().to_string(),
            right.to_string()
        );
    }

    #[test]
    fn test_handler_for_fn_return_result() {
        let input = quote! {
            #[handler]
            async fn hello(depot: &mut Depot, req: &mut Request) -> Result<(), Error> {
                Ok(())
            }
        };
        let item = parse2(input).unwrap();

        let right = quote! {
            #[allow(non_camel_case_types)]
            #[derive(Debug)]
            struct hello;
            impl hello {
                #[handler]
                async fn hello(depot: &mut Depot, req: &mut Request) -> Result<(), Error> {
                    Ok(())
                }
            }
            #[crate::async_trait]
            impl crate::Handler for hello {
                async fn handle(
                    &self,
                    req: &mut crate::Request,
                    depot: &mut crate::Depot,
                    res: &mut crate::Response,
                    ctrl: &mut crate::routing::FlowCtrl
                ) {
                    crate::Writer::write(Self::hello(depot, req).await, req, depot, res).await;
                }
            }
        };
        assert_eq!(
            handler::generate(true, item).unwrap().to_string(),
            right.to_string()
        );
    }

    #[test]
    fn test_handler_for_impl() {
        let input = quote! {
            impl Hello {
                fn handle(&self, res: &mut Response) {
                    res.render("Hello World");
                }
            }
        };
        let item = parse2(input).unwrap();

        let right = quote! {
            impl Hello {
                fn handle(&self, res: &mut Response) {
                    res.render("Hello World");
                }
            }
            #[webservice_t::async_trait]
            impl webservice_t::Handler for Hello {
                async fn handle(
                    &self,
                    req: &mut webservice_t::Request,
                    depot: &mut webservice_t::Depot,
                    res: &mut webservice_t::Response,
                    ctrl: &mut webservice_t::routing::FlowCtrl
                ) {
                    self.handle(res);
                }
            }
        };

        assert_eq!(
            handler::generate(false, item).unwrap().to_string(),
            right.to_string()
        );
    }

    #[test]
    fn test_handler_rejects_owned_params() {
        let input = quote! {
            async fn hello(name: String) {}
        };
        let item = parse2(input).unwrap();
        assert!(handler::generate(false, item).is_err());
    }
}
