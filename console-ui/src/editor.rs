//! Prompt document editor screen

use console_core::codes::CodeKind;
use console_core::screens::{EditorPhase, EditorStatus, PromptEditorController};
use console_core::{ConsoleApi, ConsoleError, EntityKind, HttpConsoleApi, Notice, PathAddress, Session};
use dioxus::prelude::*;
use serde_json::Value;
use shared_types::{FIELD_CONVERSATION_LENGTHS, FIELD_PERSONA_PROMPTS, SERVER_MANAGED_FIELDS};

use crate::components::{notify_error, publish, ConfirmDialog};

type Editor = Signal<PromptEditorController>;

fn path_of(segments: &[&str]) -> Option<PathAddress> {
    PathAddress::new(segments.iter().copied()).ok()
}

async fn reload(mut editor: Editor, api: HttpConsoleApi, session: Signal<Session>, notices: Signal<Vec<Notice>>) {
    let key = {
        let mut controller = editor.write();
        if controller.begin_load().is_err() {
            return;
        }
        controller.key().to_string()
    };
    let current_session = session.read().clone();
    let result = api.fetch_prompt(&current_session, &key).await;
    if let Err(ConsoleError::Fetch(e)) = editor.write().finish_load(result) {
        dioxus_logger::tracing::error!("Failed to load prompt {}: {}", key, e);
    }
    publish(notices, editor.write().take_notices());
}

#[component]
pub fn PromptEditorView(prompt_key: String) -> Element {
    let api = use_context::<HttpConsoleApi>();
    let session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut editor = use_signal(|| PromptEditorController::new(prompt_key.clone()));

    let load_api = api.clone();
    use_effect(move || {
        spawn(reload(editor, load_api.clone(), session, notices));
    });

    let save_api = api.clone();
    let on_save = move |_| {
        let request = match editor.write().begin_save() {
            Ok(request) => request,
            Err(ConsoleError::NothingToSave) => return,
            Err(e) => {
                notify_error(notices, e.to_string());
                return;
            }
        };
        let api = save_api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api
                .update_prompt(&current_session, &request.id, &request.payload)
                .await;
            let saved = editor.write().finish_save(result).is_ok();
            publish(notices, editor.write().take_notices());
            if saved {
                reload(editor, api, session, notices).await;
            }
        });
    };

    let delete_api = api.clone();
    let on_confirm_delete = move |_| {
        let pending = match editor.write().begin_delete() {
            Ok(pending) => pending,
            Err(e) => {
                notify_error(notices, e.to_string());
                return;
            }
        };
        let api = delete_api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api
                .detach_entity(&current_session, pending.kind, &pending.parent_id, &pending.entity_id)
                .await;
            let deleted = editor.write().finish_delete(&pending, result).is_ok();
            publish(notices, editor.write().take_notices());
            if deleted {
                reload(editor, api, session, notices).await;
            }
        });
    };

    let retry_api = api.clone();
    let controller = editor.read();
    let status = controller.status();

    if let EditorPhase::LoadError(message) = controller.phase() {
        let message = message.clone();
        return rsx! {
            div {
                class: "load-error",
                p { "Failed to load prompt configuration: {message}" }
                button {
                    onclick: move |_| {
                        spawn(reload(editor, retry_api.clone(), session, notices));
                    },
                    "Retry"
                }
            }
        };
    }

    let Some(document) = controller.document().cloned() else {
        return rsx! { div { class: "loading", "Loading prompt configuration..." } };
    };

    let scalar_leaves: Vec<(PathAddress, String)> = document
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(field, value)| value.is_string() && !SERVER_MANAGED_FIELDS.contains(&field.as_str()))
                .filter_map(|(field, _)| path_of(&[field.as_str()]).map(|path| (path, field.clone())))
                .collect()
        })
        .unwrap_or_default();
    let persona_section = path_of(&[FIELD_PERSONA_PROMPTS]);
    let persona_keys: Vec<String> = controller
        .persona_prompts()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    let pending_delete = controller.pending_delete().cloned();
    let status_label = match status {
        EditorStatus::Saving => "Saving...",
        EditorStatus::Editing => "Unsaved changes",
        EditorStatus::Loading => "Refreshing...",
        _ => "All changes saved",
    };
    let can_save = status == EditorStatus::Editing;
    drop(controller);

    rsx! {
        div {
            class: "prompt-editor",
            div {
                class: "editor-toolbar",
                span { class: "editor-status", "{status_label}" }
                button {
                    class: "secondary",
                    disabled: !can_save,
                    onclick: move |_| editor.write().cancel(),
                    "Cancel"
                }
                button { disabled: !can_save, onclick: on_save, "Save" }
            }

            for (path, label) in scalar_leaves {
                LeafEditor { key: "{label}", editor, path, label: label.clone(), multiline: false }
            }

            if let Some(section) = persona_section {
                Section {
                    editor,
                    path: section,
                    title: "Persona prompts".to_string(),
                    for key in persona_keys {
                        PersonaPromptEditor { key: "{key}", editor, persona_key: key.clone() }
                    }
                }
            }

            EntityList { editor, kind: EntityKind::Scenario }
            EntityList { editor, kind: EntityKind::RelationshipLevel }

            ConversationLengthList { editor }

            if let Some(pending) = pending_delete {
                ConfirmDialog {
                    message: format!("Delete {} \"{}\"?", pending.kind.label(), pending.title),
                    on_confirm: on_confirm_delete,
                    on_cancel: move |_| editor.write().dismiss_delete(),
                }
            }
        }
    }
}

#[component]
fn Section(editor: Editor, path: PathAddress, title: String, children: Element) -> Element {
    let mut editor = editor;
    let expanded = editor.read().accordion().is_expanded(&path);
    let marker = if expanded { "▾" } else { "▸" };

    rsx! {
        div {
            class: "section",
            button {
                class: "section-header",
                onclick: move |_| editor.write().toggle_section(&path),
                "{marker} {title}"
            }
            if expanded {
                div { class: "section-body", {children} }
            }
        }
    }
}

#[component]
fn LeafEditor(editor: Editor, path: PathAddress, label: String, multiline: bool) -> Element {
    let mut editor = editor;
    let notices = use_context::<Signal<Vec<Notice>>>();
    let value = editor
        .read()
        .value_at(&path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let dirty = editor
        .read()
        .draft()
        .is_some_and(|draft| draft.dirty().get(&path).is_some() || draft.dirty().ancestor_of(&path).is_some());

    let on_input = move |e: FormEvent| {
        if let Err(err) = editor.write().edit(path.clone(), Value::String(e.value())) {
            notify_error(notices, err.to_string());
        }
    };
    let class = if dirty { "field dirty" } else { "field" };

    rsx! {
        label {
            class,
            span { "{label}" }
            if multiline {
                textarea { value: "{value}", oninput: on_input }
            } else {
                input { value: "{value}", oninput: on_input }
            }
        }
    }
}

#[component]
fn PersonaPromptEditor(editor: Editor, persona_key: String) -> Element {
    let Some(base) = path_of(&[FIELD_PERSONA_PROMPTS, persona_key.as_str()]) else {
        return rsx! {};
    };
    let prompt = editor
        .read()
        .value_at(&base)
        .cloned()
        .unwrap_or(Value::Null);
    let title = prompt
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(persona_key.as_str())
        .to_string();

    let mut leaves: Vec<(PathAddress, String, bool)> = Vec::new();
    leaves.push((base.child("title"), "Title".to_string(), false));
    leaves.push((base.child("role"), "Role".to_string(), true));
    for kind in CodeKind::ALL {
        let field = kind.map_field();
        if let Some(Value::Object(entries)) = prompt.get(field) {
            for label in entries.keys() {
                let heading = format!("{field} / {label}");
                leaves.push((base.child(field).child(label.as_str()), heading, true));
            }
        }
    }

    rsx! {
        Section {
            editor,
            path: base,
            title,
            for (path, label, multiline) in leaves {
                LeafEditor { key: "{path}", editor, path: path.clone(), label, multiline }
            }
        }
    }
}

#[component]
fn EntityList(editor: Editor, kind: EntityKind) -> Element {
    let mut editor = editor;
    let api = use_context::<HttpConsoleApi>();
    let session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut new_title = use_signal(String::new);
    let mut new_add_on = use_signal(String::new);

    let Some(section) = path_of(&[kind.field()]) else {
        return rsx! {};
    };
    let entries = editor.read().entries(kind);

    let on_add = move |_| {
        let title = new_title.read().clone();
        let add_on = new_add_on.read().clone();
        let begin_result = editor.write().begin_attach(kind, &title, &add_on);
        let request = match begin_result {
            Ok(request) => request,
            Err(_) => {
                publish(notices, editor.write().take_notices());
                return;
            }
        };
        let api = api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api.attach_entity(&current_session, kind, &request).await;
            let added = editor.write().finish_attach(kind, result).is_ok();
            publish(notices, editor.write().take_notices());
            if added {
                new_title.set(String::new());
                new_add_on.set(String::new());
                reload(editor, api, session, notices).await;
            }
        });
    };

    let title = match kind {
        EntityKind::Scenario => "Scenarios",
        EntityKind::RelationshipLevel => "Relationship levels",
    };
    let add_label = format!("Add {}", kind.label());

    rsx! {
        Section {
            editor,
            path: section,
            title: title.to_string(),
            for entity in entries {
                EntityRow { key: "{entity.id}", editor, kind, id: entity.id.clone() }
            }
            div {
                class: "entity-new",
                input {
                    placeholder: "Title",
                    value: "{new_title}",
                    oninput: move |e: FormEvent| new_title.set(e.value()),
                }
                textarea {
                    placeholder: "Prompt add-on",
                    value: "{new_add_on}",
                    oninput: move |e: FormEvent| new_add_on.set(e.value()),
                }
                button { onclick: on_add, "{add_label}" }
            }
        }
    }
}

#[component]
fn EntityRow(editor: Editor, kind: EntityKind, id: String) -> Element {
    let mut editor = editor;
    let notices = use_context::<Signal<Vec<Notice>>>();
    let Some(entry) = path_of(&[kind.field(), id.as_str()]) else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "entity",
            LeafEditor {
                editor,
                path: entry.child("title"),
                label: "Title".to_string(),
                multiline: false,
            }
            LeafEditor {
                editor,
                path: entry.child("promptAddOn"),
                label: "Prompt add-on".to_string(),
                multiline: true,
            }
            button {
                class: "danger",
                onclick: move |_| {
                    if let Err(e) = editor.write().request_delete(kind, &id) {
                        notify_error(notices, e.to_string());
                    }
                },
                "Delete"
            }
        }
    }
}

#[component]
fn ConversationLengthList(editor: Editor) -> Element {
    let Some(section) = path_of(&[FIELD_CONVERSATION_LENGTHS]) else {
        return rsx! {};
    };
    let tiers = editor.read().conversation_lengths();

    rsx! {
        Section {
            editor,
            path: section.clone(),
            title: "Conversation lengths".to_string(),
            for tier in tiers {
                LeafEditor {
                    key: "{tier.id}",
                    editor,
                    path: section.child(tier.id.as_str()).child("promptAddOn"),
                    label: format!("{} ({}-{} messages)", tier.title, tier.range.min, tier.range.max),
                    multiline: true,
                }
            }
        }
    }
}
