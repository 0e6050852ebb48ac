use console_core::notify::NoticeQueue;
use console_core::screens::LoginController;
use console_core::{ConsoleApi, HttpConsoleApi, Notice, NoticeLevel, Session};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use uuid::Uuid;

use crate::storage::cache_session;

const NOTICE_TTL_MS: u32 = 4_000;

/// Hand controller notices to the tray.
pub fn publish(mut notices: Signal<Vec<Notice>>, drained: Vec<Notice>) {
    if !drained.is_empty() {
        notices.write().extend(drained);
    }
}

pub fn notify_error(notices: Signal<Vec<Notice>>, message: impl Into<String>) {
    let mut queue = NoticeQueue::new();
    queue.error(message);
    publish(notices, queue.take());
}

fn dismiss(mut notices: Signal<Vec<Notice>>, id: Uuid) {
    notices.write().retain(|notice| notice.id != id);
}

#[component]
pub fn NoticeTray() -> Element {
    let notices = use_context::<Signal<Vec<Notice>>>();

    rsx! {
        div {
            class: "notice-tray",
            for notice in notices.read().iter().cloned() {
                NoticeToast { key: "{notice.id}", notice }
            }
        }
    }
}

#[component]
fn NoticeToast(notice: Notice) -> Element {
    let notices = use_context::<Signal<Vec<Notice>>>();
    let id = notice.id;

    use_hook(move || {
        spawn(async move {
            TimeoutFuture::new(NOTICE_TTL_MS).await;
            dismiss(notices, id);
        });
    });

    let class = match notice.level {
        NoticeLevel::Success => "notice notice-success",
        NoticeLevel::Info => "notice notice-info",
        NoticeLevel::Error => "notice notice-error",
    };

    rsx! {
        div {
            class,
            onclick: move |_| dismiss(notices, id),
            "{notice.message}"
        }
    }
}

#[component]
pub fn ConfirmDialog(message: String, on_confirm: EventHandler<()>, on_cancel: EventHandler<()>) -> Element {
    rsx! {
        div {
            class: "dialog-scrim",
            div {
                class: "dialog",
                p { "{message}" }
                div {
                    class: "dialog-actions",
                    button { class: "secondary", onclick: move |_| on_cancel.call(()), "Cancel" }
                    button { class: "danger", onclick: move |_| on_confirm.call(()), "Confirm" }
                }
            }
        }
    }
}

#[component]
pub fn LoginView() -> Element {
    let api = use_context::<HttpConsoleApi>();
    let mut session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut login = use_signal(LoginController::new);

    let submit = move |evt: FormEvent| {
        evt.prevent_default();
        let begin_result = login.write().begin_login();
        let request = match begin_result {
            Ok(request) => request,
            Err(_) => {
                publish(notices, login.write().take_notices());
                return;
            }
        };
        let api = api.clone();
        spawn(async move {
            let result = api.login(&request).await;
            let outcome = login.write().finish_login(result);
            publish(notices, login.write().take_notices());
            if let Ok(new_session) = outcome {
                cache_session(&new_session);
                session.set(new_session);
            }
        });
    };

    let state = login.read();
    let email_class = if state.errors().has("email") { "invalid" } else { "" };
    let password_class = if state.errors().has("password") { "invalid" } else { "" };
    let submitting = state.is_submitting();

    rsx! {
        form {
            class: "login",
            onsubmit: submit,
            h1 { "Persona Console" }
            input {
                class: email_class,
                r#type: "email",
                placeholder: "Email",
                value: "{state.form.email}",
                oninput: move |e: FormEvent| login.write().form.email = e.value(),
            }
            input {
                class: password_class,
                r#type: "password",
                placeholder: "Password",
                value: "{state.form.password}",
                oninput: move |e: FormEvent| login.write().form.password = e.value(),
            }
            button {
                r#type: "submit",
                disabled: submitting,
                if submitting { "Signing in..." } else { "Sign in" }
            }
        }
    }
}
