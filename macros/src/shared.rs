use proc_macro2::{Ident, Span};
use proc_macro_crate::{crate_name, FoundCrate};
use syn::{FnArg, Meta, NestedMeta, PatType, Receiver, Type};

pub(crate) enum InputType<'a> {
    Request(&'a PatType),
    Depot(&'a PatType),
    Response(&'a PatType),
    FlowCtrl(&'a PatType),
    Unknown,
    Receiver(&'a Receiver),
    NoReference(&'a PatType),
}

pub(crate) fn webservice_crate(internal: bool) -> syn::Ident {
    if internal {
        return Ident::new("crate", Span::call_site());
    }
    match crate_name("webservice_t") {
        Ok(FoundCrate::Itself) => Ident::new("webservice_t", Span::call_site()),
        Ok(FoundCrate::Name(name)) => Ident::new(&name, Span::call_site()),
        Err(_) => Ident::new("webservice_t", Span::call_site()),
    }
}

pub(crate) fn parse_input_type(input: &FnArg) -> InputType {
    match input {
        FnArg::Typed(p) => {
            if let Type::Reference(ty) = &*p.ty {
                if let Type::Path(nty) = &*ty.elem {
                    match nty.path.segments.last().map(|s| &s.ident) {
                        Some(ident) if ident == "Request" => InputType::Request(p),
                        Some(ident) if ident == "Response" => InputType::Response(p),
                        Some(ident) if ident == "Depot" => InputType::Depot(p),
                        Some(ident) if ident == "FlowCtrl" => InputType::FlowCtrl(p),
                        _ => InputType::Unknown,
                    }
                } else {
                    InputType::Unknown
                }
            } else {
                InputType::NoReference(p)
            }
        }
        FnArg::Receiver(r) => InputType::Receiver(r),
    }
}

pub(crate) fn is_internal<'a>(args: impl Iterator<Item = &'a NestedMeta>) -> bool {
    for arg in args {
        if matches!(arg, NestedMeta::Meta(Meta::Path(p)) if p.is_ident("internal")) {
            return true;
        }
    }
    false
}
