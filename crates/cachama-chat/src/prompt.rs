//! System prompt assembly.

use cachama_core::config::PersonaConfig;
use cachama_core::types::{ChatMessage, Role};

use crate::retriever::RetrievalResult;

/// Builds the message list sent to the generator: exactly one system message
/// followed by the client's history.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: PersonaConfig,
}

impl PromptAssembler {
    pub fn new(persona: PersonaConfig) -> Self {
        Self { persona }
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    /// Photo directive template with `ID` standing in for the record id.
    pub fn photo_directive(&self) -> String {
        format!(
            "![{}]({}/fotos/ID.png)",
            self.persona.image_alt,
            self.persona.photo_base_url.trim_end_matches('/')
        )
    }

    /// System prompt embedding persona, retrieved context and the photo rule.
    pub fn system_prompt(&self, retrieval: &RetrievalResult) -> String {
        let p = &self.persona;
        let mut lines = vec![
            format!(
                "Eres el asistente virtual oficial de \"{}\" en {}.",
                p.business_name, p.location
            ),
            String::new(),
            "TU PERSONALIDAD:".to_string(),
            format!("- Tono: {}", p.tone),
            format!("- Saludo: \"{}\"", p.greeting),
            format!("- Estilo: {}", p.style),
            String::new(),
            "DATOS REALES DEL MENÚ (Precios y Descripciones):".to_string(),
            retrieval.to_context(p),
            String::new(),
            "INSTRUCCIONES CLAVE:".to_string(),
        ];

        for (i, instruction) in p.instructions.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, instruction));
        }
        lines.push(format!(
            "{}. AL RECOMENDAR UN PLATO, termina SIEMPRE la respuesta con su foto al final, así: {} (reemplaza ID por el id del plato tal cual aparece en los datos, por ejemplo 01 o 20).",
            p.instructions.len() + 1,
            self.photo_directive()
        ));

        lines.join("\n")
    }

    /// Full message list for one turn. Client-supplied system messages are
    /// dropped so the assembled prompt is the only one.
    pub fn build(&self, history: &[ChatMessage], retrieval: &RetrievalResult) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt(retrieval)));
        messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
        messages
    }
}
