use crate::domain::reply::{GenerationError, ReplyGenerator, ReplyStyle};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

const MAX_REPLY_TOKENS: u32 = 150;

fn system_prompt(style: ReplyStyle) -> &'static str {
    match style {
        ReplyStyle::Flirty => {
            "You suggest one short, playful and flirty reply to the chat message you are given. \
             Answer with the reply text only."
        }
        ReplyStyle::Witty => {
            "You suggest one short, clever and witty reply to the chat message you are given. \
             Answer with the reply text only."
        }
        ReplyStyle::Savage => {
            "You suggest one short, bold and teasing comeback to the chat message you are given, \
             never hateful. Answer with the reply text only."
        }
    }
}

fn upstream(e: OpenAIError) -> GenerationError {
    GenerationError::Upstream(e.to_string())
}

/// Reply generation through the OpenAI chat completions API
pub struct OpenAiReplyRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiReplyRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiReplyRepository {
    async fn generate_reply(
        &self,
        text: &str,
        style: ReplyStyle,
    ) -> Result<String, GenerationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(MAX_REPLY_TOKENS)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt(style))
                    .build()
                    .map_err(upstream)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text)
                    .build()
                    .map_err(upstream)?
                    .into(),
            ])
            .build()
            .map_err(upstream)?;

        tracing::debug!(
            model = %self.model,
            style = %style,
            input_length = text.len(),
            "Requesting reply from OpenAI"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(error = %e, model = %self.model, "OpenAI chat completion failed");
            upstream(e)
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().trim_matches('"').to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::Empty)
    }
}
