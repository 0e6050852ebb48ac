//! Conversation and prompt generator screens

use console_core::codes::{CodeKind, CodeNormalizer};
use console_core::screens::prompt_generator::models_for;
use console_core::screens::{ConversationController, PromptGeneratorController, PROVIDER_MODELS};
use console_core::{ConsoleApi, HttpConsoleApi, Notice, Session};
use dioxus::prelude::*;
use serde_json::Value;
use shared_types::{PersonaGender, DEFAULT_LANGUAGE};

use crate::components::publish;
use crate::storage::LocalStorageStore;

fn render_output(output: Option<&Value>) -> Option<String> {
    output.map(|value| match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[component]
fn CodeSelect(
    kind: CodeKind,
    value: Option<String>,
    #[props(default)] optional: bool,
    #[props(default)] invalid: bool,
    on_change: EventHandler<Option<String>>,
) -> Element {
    let normalizer = use_hook(CodeNormalizer::standard);
    let options: Vec<(String, String)> = normalizer
        .codes(kind)
        .into_iter()
        .map(|code| (code.to_string(), normalizer.label_for(kind, code)))
        .collect();
    let selected = value.unwrap_or_default();

    rsx! {
        select {
            class: if invalid { "invalid" } else { "" },
            value: "{selected}",
            onchange: move |e: FormEvent| on_change.call(non_empty(e.value())),
            if optional {
                option { value: "", "None" }
            }
            for (code, label) in options {
                option { key: "{code}", value: "{code}", selected: code == selected, "{label}" }
            }
        }
    }
}

#[component]
fn ModelPicker(provider: String, model: String, on_provider: EventHandler<String>, on_model: EventHandler<String>) -> Element {
    let mut models: Vec<String> = models_for(&provider).iter().map(|m| m.to_string()).collect();
    if !model.is_empty() && !models.contains(&model) {
        models.push(model.clone());
    }

    rsx! {
        select {
            value: "{provider}",
            onchange: move |e: FormEvent| on_provider.call(e.value()),
            for (name, _) in PROVIDER_MODELS.iter() {
                option { key: "{name}", value: "{name}", selected: *name == provider, "{name}" }
            }
        }
        select {
            value: "{model}",
            onchange: move |e: FormEvent| on_model.call(e.value()),
            for name in models {
                option { key: "{name}", value: "{name}", selected: name == model, "{name}" }
            }
        }
    }
}

#[component]
pub fn ConversationView() -> Element {
    let api = use_context::<HttpConsoleApi>();
    let session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut generator = use_signal(|| ConversationController::from_store(&LocalStorageStore));

    let mut update = move |apply: &dyn Fn(&mut ConversationController)| {
        apply(&mut generator.write());
        generator.read().save_defaults(&LocalStorageStore);
    };

    let on_generate = move |_| {
        let begin_result = generator.write().begin_generate();
        let request = match begin_result {
            Ok(request) => request,
            Err(_) => {
                publish(notices, generator.write().take_notices());
                return;
            }
        };
        let api = api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api.generate_conversation(&current_session, &request).await;
            let _ = generator.write().finish_generate(result);
            publish(notices, generator.write().take_notices());
        });
    };

    let state = generator.read();
    let form = state.form.clone();
    let errors = state.errors().clone();
    let generating = state.is_generating();
    let output = render_output(state.output());
    drop(state);

    let gender = match form.persona_gender {
        Some(PersonaGender::Male) => "male",
        Some(PersonaGender::Female) => "female",
        None => "",
    };
    let needs_dialect = form.language != DEFAULT_LANGUAGE;

    rsx! {
        div {
            class: "generator",
            h2 { "Conversation generator" }
            label {
                span { "Persona gender" }
                select {
                    class: if errors.has("personaGender") { "invalid" } else { "" },
                    value: "{gender}",
                    onchange: move |e: FormEvent| {
                        let value = match e.value().as_str() {
                            "male" => Some(PersonaGender::Male),
                            "female" => Some(PersonaGender::Female),
                            _ => None,
                        };
                        update(&|g| g.form.persona_gender = value);
                    },
                    option { value: "", "Select..." }
                    option { value: "male", selected: gender == "male", "Male" }
                    option { value: "female", selected: gender == "female", "Female" }
                }
            }
            label {
                span { "Message type" }
                input {
                    class: if errors.has("messageType") { "invalid" } else { "" },
                    value: "{form.message_type}",
                    oninput: move |e: FormEvent| generator.write().form.message_type = e.value(),
                }
            }
            label {
                span { "Language" }
                CodeSelect {
                    kind: CodeKind::Language,
                    value: Some(form.language.clone()),
                    on_change: move |value: Option<String>| {
                        let language = value.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
                        update(&|g| g.set_language(language.clone()));
                    },
                }
            }
            if needs_dialect {
                label {
                    span { "Dialect" }
                    CodeSelect {
                        kind: CodeKind::Dialect,
                        value: form.dialect.clone(),
                        optional: true,
                        invalid: errors.has("dialect"),
                        on_change: move |value: Option<String>| update(&|g| g.form.dialect = value.clone()),
                    }
                }
            }
            label {
                span { "Style" }
                CodeSelect {
                    kind: CodeKind::Style,
                    value: form.style.clone(),
                    optional: true,
                    on_change: move |value: Option<String>| update(&|g| g.form.style = value.clone()),
                }
            }
            ModelPicker {
                provider: form.provider.clone(),
                model: form.model.clone(),
                on_provider: move |provider: String| update(&|g| g.form.provider = provider.clone()),
                on_model: move |model: String| update(&|g| g.form.model = model.clone()),
            }
            button {
                disabled: generating,
                onclick: on_generate,
                if generating { "Generating..." } else { "Generate" }
            }
            if let Some(text) = output {
                pre { class: "generator-output", "{text}" }
            }
        }
    }
}

#[component]
pub fn PromptGeneratorView() -> Element {
    let api = use_context::<HttpConsoleApi>();
    let session = use_context::<Signal<Session>>();
    let notices = use_context::<Signal<Vec<Notice>>>();
    let mut generator = use_signal(|| PromptGeneratorController::from_store(&LocalStorageStore));

    let mut update = move |apply: &dyn Fn(&mut PromptGeneratorController)| {
        apply(&mut generator.write());
        generator.read().save_defaults(&LocalStorageStore);
    };

    let on_generate = move |_| {
        let begin_result = generator.write().begin_generate();
        let request = match begin_result {
            Ok(request) => request,
            Err(_) => {
                publish(notices, generator.write().take_notices());
                return;
            }
        };
        let api = api.clone();
        spawn(async move {
            let current_session = session.read().clone();
            let result = api.generate_prompt(&current_session, &request).await;
            let _ = generator.write().finish_generate(result);
            publish(notices, generator.write().take_notices());
        });
    };

    let state = generator.read();
    let form = state.form.clone();
    let errors = state.errors().clone();
    let generating = state.is_generating();
    let output = render_output(state.output());
    drop(state);
    let needs_dialect = form.language != DEFAULT_LANGUAGE;

    rsx! {
        div {
            class: "generator",
            h2 { "Prompt generator" }
            label {
                span { "Persona key" }
                input {
                    class: if errors.has("personaKey") { "invalid" } else { "" },
                    value: "{form.persona_key}",
                    oninput: move |e: FormEvent| generator.write().form.persona_key = e.value(),
                }
            }
            label {
                span { "Language" }
                CodeSelect {
                    kind: CodeKind::Language,
                    value: Some(form.language.clone()),
                    on_change: move |value: Option<String>| {
                        let language = value.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
                        update(&|g| g.form.language = language.clone());
                    },
                }
            }
            if needs_dialect {
                label {
                    span { "Dialect" }
                    CodeSelect {
                        kind: CodeKind::Dialect,
                        value: form.dialect.clone(),
                        optional: true,
                        invalid: errors.has("dialect"),
                        on_change: move |value: Option<String>| update(&|g| g.form.dialect = value.clone()),
                    }
                }
            }
            label {
                span { "Style" }
                CodeSelect {
                    kind: CodeKind::Style,
                    value: form.style.clone(),
                    optional: true,
                    on_change: move |value: Option<String>| update(&|g| g.form.style = value.clone()),
                }
            }
            label {
                span { "Instructions" }
                textarea {
                    class: if errors.has("instructions") { "invalid" } else { "" },
                    value: "{form.instructions}",
                    oninput: move |e: FormEvent| generator.write().form.instructions = e.value(),
                }
            }
            ModelPicker {
                provider: form.provider.clone(),
                model: form.model.clone(),
                on_provider: move |provider: String| update(&|g| g.form.set_provider(provider.clone())),
                on_model: move |model: String| update(&|g| g.form.set_model(model.clone())),
            }
            button {
                disabled: generating,
                onclick: on_generate,
                if generating { "Generating..." } else { "Generate" }
            }
            if let Some(text) = output {
                pre { class: "generator-output", "{text}" }
            }
        }
    }
}
