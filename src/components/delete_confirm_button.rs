//! Delete Confirm Button Component
//!
//! Inline two-step delete: × arms the confirmation, ✓ fires the callback.

use leptos::prelude::*;

/// Inline delete confirmation button shown on card hover.
#[component]
pub fn DeleteConfirmButton(#[prop(into)] on_confirm: Callback<()>) -> impl IntoView {
    let (armed, set_armed) = signal(false);

    view! {
        <Show when=move || !armed.get()>
            <button
                class="card-delete-btn"
                on:click=move |ev| {
                    ev.stop_propagation();
                    set_armed.set(true);
                }
            >
                "×"
            </button>
        </Show>
        <Show when=move || armed.get()>
            <span class="delete-confirm">
                <button
                    class="confirm-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        on_confirm.run(());
                    }
                >
                    "✓"
                </button>
                <button
                    class="cancel-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_armed.set(false);
                    }
                >
                    "✗"
                </button>
            </span>
        </Show>
    }
}
