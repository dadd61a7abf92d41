//! Character API client methods

use super::{ApiClient, ClientError};
use questscribe_core::types::{
    Character, CharacterImage, ConversationMessage, GenerateImageRequest, NegotiateRequest,
    NegotiateResponse, SaveCharacterRequest, SaveCharacterResponse, UpdateSheetRequest,
};
use serde_json::Value;

impl ApiClient {
    /// List the player's characters
    pub async fn list_characters(&self) -> Result<Vec<Character>, ClientError> {
        self.get("characters").await
    }

    /// Fetch one character
    pub async fn get_character(&self, character_id: i64) -> Result<Character, ClientError> {
        self.get(&format!("character/{character_id}")).await
    }

    /// Delete a character with its sessions and logs.
    ///
    /// Deleting an id that no longer exists is an error, not a no-op.
    pub async fn delete_character(&self, character_id: i64) -> Result<(), ClientError> {
        let _: Value = self.delete(&format!("character/{character_id}")).await?;
        Ok(())
    }

    /// One conversational turn of AI-assisted character creation
    pub async fn negotiate_character(
        &self,
        messages: &[ConversationMessage],
    ) -> Result<String, ClientError> {
        let response: NegotiateResponse = self
            .post(
                "ai/negotiate",
                &NegotiateRequest {
                    messages: messages.to_vec(),
                },
            )
            .await?;
        Ok(response.response)
    }

    /// Persist a character built through negotiation
    pub async fn save_character_from_conversation(
        &self,
        request: &SaveCharacterRequest,
    ) -> Result<SaveCharacterResponse, ClientError> {
        self.post("character/saveFromConversation", request).await
    }

    /// Replace the character sheet text
    pub async fn update_character_sheet(
        &self,
        character_id: i64,
        sheet: impl Into<String>,
    ) -> Result<(), ClientError> {
        let _: Value = self
            .put(
                &format!("character/{character_id}/sheet"),
                &UpdateSheetRequest {
                    character_sheet: sheet.into(),
                },
            )
            .await?;
        Ok(())
    }

    /// Ask the AI service to draw the character
    pub async fn generate_character_image(
        &self,
        character_id: i64,
        prompt: Option<String>,
    ) -> Result<CharacterImage, ClientError> {
        self.post(
            &format!("character/{character_id}/image/generate"),
            &GenerateImageRequest { prompt },
        )
        .await
    }

    /// Attach an image URL to the character
    pub async fn save_character_image(
        &self,
        character_id: i64,
        image_url: impl Into<String>,
    ) -> Result<(), ClientError> {
        let _: Value = self
            .post(
                &format!("character/{character_id}/image"),
                &CharacterImage {
                    image_url: image_url.into(),
                },
            )
            .await?;
        Ok(())
    }
}
