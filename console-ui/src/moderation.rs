//! Pickup line submission review screen

use console_core::screens::ModerationController;
use console_core::{ConsoleApi, HttpConsoleApi, Notice, Session};
use dioxus::prelude::*;

use crate::components::{notify_error, publish, ConfirmDialog};

#[component]
pub fn ModerationView() -> Element {
    let api = use_context::<HttpConsoleApi>();
    let session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut moderation = use_signal(ModerationController::new);

    let load_api = api.clone();
    let load = move || {
        let api = load_api.clone();
        async move {
            if moderation.write().begin_load().is_err() {
                return;
            }
            let current_session = session.read().clone();
            let result = api.list_submissions(&current_session).await;
            let _ = moderation.write().finish_load(result);
            publish(notices, moderation.write().take_notices());
        }
    };

    let initial = load.clone();
    use_effect(move || {
        spawn(initial());
    });

    let approve_api = api.clone();
    let on_approve = move |submission_id: String| {
        let request = match moderation.write().begin_approve(&submission_id) {
            Ok(request) => request,
            Err(e) => {
                notify_error(notices, e.to_string());
                return;
            }
        };
        let api = approve_api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api.review_submission(&current_session, &request).await;
            let _ = moderation.write().finish_review(&request, result);
            publish(notices, moderation.write().take_notices());
        });
    };

    let reject_api = api.clone();
    let on_confirm_reject = move |_| {
        let request = match moderation.write().begin_reject() {
            Ok(request) => request,
            Err(e) => {
                notify_error(notices, e.to_string());
                return;
            }
        };
        let api = reject_api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api.review_submission(&current_session, &request).await;
            let _ = moderation.write().finish_review(&request, result);
            publish(notices, moderation.write().take_notices());
        });
    };

    let state = moderation.read();
    let submissions = state.submissions().to_vec();
    let loading = state.is_loading();
    let load_error = state.load_error().map(str::to_string);
    let reviewing = state.reviewing().map(str::to_string);
    let pending_reject = state.pending_reject().cloned();
    drop(state);

    rsx! {
        div {
            class: "moderation",
            div {
                class: "moderation-toolbar",
                h2 { "Pickup line submissions" }
                button {
                    class: "secondary",
                    disabled: loading,
                    onclick: move |_| {
                        spawn(load());
                    },
                    if loading { "Refreshing..." } else { "Refresh" }
                }
            }

            if let Some(message) = load_error {
                p { class: "load-error", "Failed to load submissions: {message}" }
            } else if submissions.is_empty() && !loading {
                p { class: "empty", "No submissions waiting for review" }
            }

            ul {
                class: "submissions",
                for submission in submissions {
                    li {
                        key: "{submission.id}",
                        class: "submission",
                        p { class: "submission-text", "{submission.text}" }
                        if let Some(author) = submission.author.clone() {
                            span { class: "submission-author", "{author}" }
                        }
                        if let Some(language) = submission.language.clone() {
                            span { class: "submission-language", "{language}" }
                        }
                        div {
                            class: "submission-actions",
                            button {
                                disabled: reviewing.is_some(),
                                onclick: {
                                    let id = submission.id.clone();
                                    let mut on_approve = on_approve.clone();
                                    move |_| on_approve(id.clone())
                                },
                                "Approve"
                            }
                            button {
                                class: "danger",
                                disabled: reviewing.is_some(),
                                onclick: {
                                    let id = submission.id.clone();
                                    move |_| {
                                        if let Err(e) = moderation.write().request_reject(&id) {
                                            notify_error(notices, e.to_string());
                                        }
                                    }
                                },
                                "Reject"
                            }
                        }
                    }
                }
            }

            if let Some(pending) = pending_reject {
                ConfirmDialog {
                    message: format!("Reject \"{}\"?", pending.text),
                    on_confirm: on_confirm_reject,
                    on_cancel: move |_| moderation.write().dismiss_reject(),
                }
            }
        }
    }
}
