use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, ItemStruct, Path, Token};

struct ModuleArgs {
    depends_on: Vec<Path>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut depends_on = Vec::new();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            // Parse array: [ModuleA, ModuleB, ...]
            let content;
            syn::bracketed!(content in input);

            if name == "depends_on" {
                let items = content.parse_terminated(Path::parse, Token![,])?;
                depends_on = items.into_iter().collect();
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "unknown module argument, expected `depends_on = [..]`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ModuleArgs { depends_on })
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_meta_impl(&args, &input);

    TokenStream::from(expanded)
}

fn generate_meta_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;

    let dependency_ids = args.depends_on.iter().map(|path| {
        quote! {
            <#path as ::modulith::ModuleMeta>::module_id()
        }
    });

    quote! {
        #input

        impl ::modulith::ModuleMeta for #module_name {
            fn dependencies() -> ::std::vec::Vec<::modulith::ModuleId> {
                ::std::vec![ #(#dependency_ids),* ]
            }
        }
    }
}
