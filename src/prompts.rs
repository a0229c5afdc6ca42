use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::Serialize;

use crate::error::{AnalyzerError, Result};
use crate::model::{Message, Role};

pub const ANALYZE_SYSTEM_PROMPT: &str = "Você é um consultor especialista em acessibilidade web, especializado em conformidade com WCAG 2.1 AA e AAA. \nAnalise o conteúdo HTML em busca de problemas de acessibilidade e forneça recomendações práticas.

Foque em:
- Estrutura HTML semântica
- Atributos e funções ARIA
- Hierarquia de cabeçalhos (um único H1, aninhamento adequado)
- Taxas de contraste de cor
- Navegação por teclado
- Rótulos de formulário e mensagens de erro
- Texto alternativo de imagens
- Indicadores de foco

Forneça sua análise em um formato claro e estruturado com:
1. Resumo (pontuação geral de acessibilidade de 0 a 100)
2. Problemas críticos (deve corrigir imediatamente)
3. Avisos (deve corrigir em breve)
4. Recomendações (melhorias desejáveis)
5. Exemplos de código específicos para correções";

pub const SUGGEST_SYSTEM_PROMPT: &str = "Você é um consultor especialista em acessibilidade web. Com base no conteúdo HTML fornecido, sugira melhorias específicas para tornar o site mais acessível.
Foque em sugestões práticas e implementáveis com exemplos de código.";

pub const CHAT_SYSTEM_PROMPT: &str = "Você é um assistente especialista em acessibilidade. Responda perguntas sobre acessibilidade web, diretrizes WCAG e melhores práticas.";

const ANALYZE_USER_PREFIX: &str = "Analise este conteúdo HTML quanto a problemas de acessibilidade:\n\n";
const SUGGEST_USER_PREFIX: &str = "Sugira melhorias de acessibilidade para este HTML:\n\n";

/// What the caller wants done with the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Full WCAG audit of an HTML fragment.
    Analyze,
    /// Improvement suggestions for an HTML fragment.
    Suggest,
    /// Free-form accessibility question.
    Chat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Analyze => "analyze",
            Action::Suggest => "suggest",
            Action::Chat => "chat",
        }
    }

    /// Maps the raw `action` field onto an [`Action`].
    ///
    /// In lenient mode anything unrecognized (including a missing field) is
    /// answered as chat. In strict mode it is rejected.
    pub fn resolve(raw: Option<&str>, strict: bool) -> Result<Action> {
        let raw = raw.unwrap_or_default();
        match raw.parse::<Action>() {
            Ok(action) => Ok(action),
            Err(err) if strict => Err(err),
            Err(_) => {
                warn!("Unrecognized action {:?}, answering as chat", raw);
                Ok(Action::Chat)
            }
        }
    }
}

impl FromStr for Action {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "analyze" => Ok(Action::Analyze),
            "suggest" => Ok(Action::Suggest),
            "chat" => Ok(Action::Chat),
            other => Err(AnalyzerError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn build(action: Action, content: &str) -> Self {
        match action {
            Action::Analyze => Self {
                system: ANALYZE_SYSTEM_PROMPT.to_string(),
                user: format!("{}{}", ANALYZE_USER_PREFIX, content),
            },
            Action::Suggest => Self {
                system: SUGGEST_SYSTEM_PROMPT.to_string(),
                user: format!("{}{}", SUGGEST_USER_PREFIX, content),
            },
            // In chat mode the content is the user's question.
            Action::Chat => Self {
                system: CHAT_SYSTEM_PROMPT.to_string(),
                user: content.to_string(),
            },
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        vec![
            Message {
                role: Role::System,
                content: self.system,
            },
            Message {
                role: Role::User,
                content: self.user,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<img src=\"logo.png\">";

    #[test]
    fn analyze_embeds_html_after_prefix() {
        let pair = PromptPair::build(Action::Analyze, HTML);
        assert_eq!(pair.system, ANALYZE_SYSTEM_PROMPT);
        assert_eq!(
            pair.user,
            "Analise este conteúdo HTML quanto a problemas de acessibilidade:\n\n<img src=\"logo.png\">"
        );
        assert!(pair.system.starts_with("Você é um consultor especialista em acessibilidade web, especializado em conformidade com WCAG 2.1 AA e AAA. \n"));
        assert!(pair.system.ends_with("5. Exemplos de código específicos para correções"));
    }

    #[test]
    fn suggest_embeds_html_after_prefix() {
        let pair = PromptPair::build(Action::Suggest, HTML);
        assert_eq!(pair.system, SUGGEST_SYSTEM_PROMPT);
        assert_eq!(
            pair.user,
            "Sugira melhorias de acessibilidade para este HTML:\n\n<img src=\"logo.png\">"
        );
    }

    #[test]
    fn chat_passes_question_through() {
        let pair = PromptPair::build(Action::Chat, "O que é WCAG?");
        assert_eq!(pair.system, CHAT_SYSTEM_PROMPT);
        assert_eq!(pair.user, "O que é WCAG?");
    }

    #[test]
    fn messages_are_system_then_user() {
        let messages = PromptPair::build(Action::Chat, "q").into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "q");
    }

    #[test]
    fn lenient_resolution_falls_back_to_chat() {
        assert_eq!(Action::resolve(Some("analyze"), false).unwrap(), Action::Analyze);
        assert_eq!(Action::resolve(Some("suggest"), false).unwrap(), Action::Suggest);
        assert_eq!(Action::resolve(Some("summarize"), false).unwrap(), Action::Chat);
        assert_eq!(Action::resolve(None, false).unwrap(), Action::Chat);
    }

    #[test]
    fn strict_resolution_rejects_unknown() {
        assert_eq!(Action::resolve(Some("chat"), true).unwrap(), Action::Chat);
        match Action::resolve(Some("Analyze"), true) {
            Err(AnalyzerError::UnknownAction(raw)) => assert_eq!(raw, "Analyze"),
            other => panic!("expected UnknownAction, got {:?}", other),
        }
        assert!(Action::resolve(None, true).is_err());
    }
}
