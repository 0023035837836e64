use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, LitInt, Pat};

/// Time a navigation system when the `perf_stats` feature is enabled.
///
/// The wrapped body runs unchanged. With `perf_stats` on, a guard measures the
/// call and logs through `bevy::log::warn!` when it takes longer than the
/// threshold (milliseconds, default 1). Systems that take `tick: Res<SimTick>`
/// additionally report every 100th tick at `info` level, which gives a steady
/// sample even when nothing is slow.
///
/// ```ignore
/// #[profile(2)]
/// pub fn drive_inline_pathfinding(tick: Res<SimTick>, /* ... */) { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        let lit = parse_macro_input!(attr as LitInt);
        match lit.base10_parse() {
            Ok(ms) => ms,
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let name = sig.ident.to_string();

    let tick_param = sig.inputs.iter().any(|arg| match arg {
        FnArg::Typed(pat_type) => match &*pat_type.pat {
            Pat::Ident(ident) if ident.ident == "tick" => {
                let ty = &pat_type.ty;
                quote!(#ty).to_string().contains("SimTick")
            }
            _ => false,
        },
        FnArg::Receiver(_) => false,
    });

    let (tick_field, tick_init, tick_report) = if tick_param {
        (
            quote! { tick: u64, },
            quote! { tick: tick.0, },
            quote! {
                if self.tick % 100 == 0 {
                    bevy::log::info!("[PERF] {} (tick {}): {:?}", self.name, self.tick, elapsed);
                }
            },
        )
    } else {
        (quote! {}, quote! {}, quote! {})
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_guard = {
                struct ProfileGuard {
                    name: &'static str,
                    started: std::time::Instant,
                    #tick_field
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.started.elapsed();
                        if elapsed.as_millis() > #threshold_ms {
                            bevy::log::warn!("[PERF] {} took {:?} (budget {}ms)", self.name, elapsed, #threshold_ms);
                        }
                        #tick_report
                    }
                }
                ProfileGuard {
                    name: #name,
                    started: std::time::Instant::now(),
                    #tick_init
                }
            };

            #block
        }
    };

    output.into()
}
