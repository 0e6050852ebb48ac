use console_core::settings::{load_active_tab, save_active_tab};
use console_core::{Notice, Session};
use dioxus::prelude::*;

use crate::api::console_api;
use crate::components::{LoginView, NoticeTray};
use crate::editor::PromptEditorView;
use crate::generators::{ConversationView, PromptGeneratorView};
use crate::moderation::ModerationView;
use crate::storage::{cache_session, cached_session, LocalStorageStore};

/// Prompt document the editor opens
pub const PROMPT_KEY: &str = "pickupLines";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Prompts,
    Conversation,
    PromptGenerator,
    PickupLines,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Prompts, Tab::Conversation, Tab::PromptGenerator, Tab::PickupLines];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Prompts => "prompts",
            Tab::Conversation => "conversation",
            Tab::PromptGenerator => "promptGenerator",
            Tab::PickupLines => "pickupLines",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.as_str() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Prompts => "Prompts",
            Tab::Conversation => "Conversation",
            Tab::PromptGenerator => "Prompt generator",
            Tab::PickupLines => "Pickup lines",
        }
    }
}

#[component]
pub fn App() -> Element {
    use_context_provider(console_api);
    let session = use_context_provider(|| Signal::new(cached_session()));
    use_context_provider(|| Signal::new(Vec::<Notice>::new()));

    let authenticated = session.read().is_authenticated();

    rsx! {
        div {
            class: "console",
            if authenticated {
                Console {}
            } else {
                LoginView {}
            }
            NoticeTray {}
        }
    }
}

#[component]
fn Console() -> Element {
    let mut session = use_context::<Signal<Session>>();
    let mut active = use_signal(|| {
        load_active_tab(&LocalStorageStore)
            .and_then(|name| Tab::parse(&name))
            .unwrap_or_default()
    });

    let mut select = move |tab: Tab| {
        active.set(tab);
        save_active_tab(&LocalStorageStore, tab.as_str());
    };

    let logout = move |_| {
        let anonymous = Session::anonymous();
        cache_session(&anonymous);
        session.set(anonymous);
    };

    let current = *active.read();
    let tabs = Tab::ALL.map(|tab| (tab, tab.as_str(), tab.title()));

    rsx! {
        nav {
            class: "tabs",
            for (tab, name, title) in tabs {
                button {
                    key: "{name}",
                    class: if tab == current { "tab active" } else { "tab" },
                    onclick: move |_| select(tab),
                    "{title}"
                }
            }
            button { class: "secondary logout", onclick: logout, "Log out" }
        }
        main {
            class: "tab-body",
            match current {
                Tab::Prompts => rsx! { PromptEditorView { prompt_key: PROMPT_KEY.to_string() } },
                Tab::Conversation => rsx! { ConversationView {} },
                Tab::PromptGenerator => rsx! { PromptGeneratorView {} },
                Tab::PickupLines => rsx! { ModerationView {} },
            }
        }
    }
}
