//! Prompt templates for the generation operations.
//!
//! The templates are the product: they encode the brand-fidelity rules the
//! downstream video AI is held to. Keep edits deliberate.

use promptgen_models::LanguageCode;

/// Shared branding block demanded of every product-bearing prompt.
const BRANDING_BLOCK: &str = r#"- **Negative Prompt:** List elements to avoid. **CRITICAL:** Include 'generic logos', 'inaccurate branding', 'stylized or altered logos', 'mismatched fonts'. For example: 'no scratches, no reflections, no blurry text, no generic logos'.
- **Style References:** Suggest visual styles for the video (e.g., 'cinematic, golden hour lighting', 'vibrant and poppy, high-energy', 'minimalist, clean aesthetic').
- **Branding, logos, and text (ABSOLUTE CRITICAL REQUIREMENT - HIGHEST PRIORITY):**
    1.  **Identify Brand:** Identify the brand from the product image.
    2.  **Internet Research Simulation:** Based on the brand identified, simulate an internet search to find the official logo, brand colors (including hex codes if possible), and typography/fonts.
    3.  **Meticulous Description with Weighted Elements:** Describe the logo in extreme detail. **Recognize that logos are graphical images, not just text.** The video AI must treat the following elements with the highest priority, considering them weighted instructions for generation:
        - **Logo Integrity (Weight: 2.0):** NO DEVIATIONS FROM REFERENCE. Describe the logo's shapes, symbols, and graphical elements. The logo must be a perfect, 1:1 graphical replication of the official brand logo.
        - **Colors (Weight: 1.8):** Exact color matching is mandatory. Specify official brand colors (with hex codes if found).
        - **Transparency (Weight: 1.5):** If the logo's graphic has transparent or negative space elements, describe them precisely.
        - **Style (Weight: 1.5):** Replicate the logo's specific graphical style (e.g., flat, 3D, minimalist, illustrative).
        - **Typography (Weight: 1.7, if applicable):** **ONLY if the logo includes text**, all text must use the correct, official brand font. No substitute fonts are acceptable.
    Any failure to adhere to these weighted instructions for the official branding is a failure of the entire task.
- **Colors:** All visible colors on the product. Use specific, descriptive names if possible (e.g., 'cerulean blue body', 'off-white cap', 'rose gold trim').
- **Materials, textures, and finish:** Describe the product's physical textures (e.g., 'matte plastic body', 'glossy screen', 'brushed aluminum accents').
- **Design, shape, and form factor:** Describe the product's physical shape and design language (e.g., 'ergonomic and curved', 'sleek and angular').
- **Subject details:** Exact match to reference. All details, proportions, and placements of features on the product must be perfectly replicated."#;

/// Template for the influencer + product video prompt.
pub fn video_prompt_template(language: LanguageCode) -> String {
    let language_name = language.display_name();
    format!(
        r#"You are an expert creative director specializing in short-form video content for social media, with a paramount focus on perfect brand representation.
Analyze the images provided.
The first image contains an influencer. The subsequent images show a single product from multiple angles and in different contexts. Synthesize information from ALL product images to build a complete, detailed understanding of it.

Based on your analysis, generate a detailed prompt for a video generation AI. The video should feature the influencer using or showcasing the product in a compelling way.

The output must be a single block of Markdown text.

The prompt must be structured exactly as follows:

**Video Concept:** A brief, engaging concept for a 15-second vertical video.

**Scene Description:** Describe the scene, the influencer's actions, and how they interact with the product.

**Influencer Details:**
- **Appearance:** Describe the influencer's key visual characteristics from the image (hair color, style, facial features). The description must be photographic and precise to ensure an identical recreation.
- **Style:** Describe the influencer's clothing and overall style.
- **Vibe:** Describe the influencer's mood or personality as perceived from the image (e.g., energetic, calm, sophisticated).

**Product Details (CRITICAL - BE EXTREMELY PRECISE):**
{BRANDING_BLOCK}

**Shot List & Camera Angles:** Suggest 2-3 dynamic shots for the video (e.g., 'Extreme close-up on the product logo', 'Medium shot of the influencer smiling while using the product').

**Lighting:** Suggest a lighting style that complements the mood (e.g., 'Soft, natural window light', 'Dramatic studio lighting with colored gels').

**Dialogue/Speech:** Generate a short, natural-sounding, and persuasive line of dialogue **to be spoken *directly by the influencer* shown in the video, not as a separate narrator or voice-over**. The dialogue MUST be in **{language_name}**. It must achieve three things:
1.  **Sound authentic:** Use a conversational and engaging tone, as if the influencer is speaking directly to their audience.
2.  **Highlight benefits:** Briefly talk about the key benefits of the product.
3.  **Call to action:** Conclude by telling viewers the purchase link is in the description or a pinned comment.
"#
    )
}

/// Template for the product-only advertisement prompt.
pub fn product_ad_template(language: LanguageCode) -> String {
    let language_name = language.display_name();
    format!(
        r#"You are an expert creative director specializing in short-form video content for social media, with a paramount focus on perfect brand representation.
Analyze the images provided, which show a single product from multiple angles and in different contexts. Synthesize information from ALL product images to build a complete, detailed understanding of it.

Based on your analysis, generate a detailed prompt for a video generation AI. The video should be a compelling 15-second vertical advertisement for the product.

The output must be a single block of Markdown text.

The prompt must be structured exactly as follows:

**Video Concept:** A brief, engaging concept for the 15-second advertisement.

**Scene Description:** Describe a series of dynamic scenes showcasing the product. Focus on visual storytelling, making the product the hero of the video.

**Product Details (CRITICAL - BE EXTREMELY PRECISE):**
{BRANDING_BLOCK}

**Shot List & Camera Angles:** Suggest 3-4 dynamic shots for the video (e.g., 'Extreme close-up on the product logo', 'Cinematic panning shot across the product surface', 'Product hero shot on a clean background').

**Lighting:** Suggest a lighting style that highlights the product's features (e.g., 'Dramatic studio lighting', 'Bright, clean commercial lighting').

**Voice-over Script:** Generate a short, persuasive, and professional voice-over script. The script MUST be in **{language_name}**. It must achieve three things:
1.  **Grab attention:** Start with a hook that piques interest.
2.  **Highlight benefits:** Clearly communicate the product's key features and benefits.
3.  **Strong call to action:** Conclude by directing the audience on how to purchase or learn more (e.g., 'Click the link in bio to get yours today!').
"#
    )
}

/// Template for the influencer-only prompt (no product).
pub fn influencer_only_template(actions: &str, language: LanguageCode) -> String {
    let language_name = language.display_name();
    format!(
        r#"You are an expert creative director specializing in short-form video content for social media.
Analyze the image of the influencer provided. The user has also provided a description of the actions the influencer should perform.

**User-provided actions:** "{actions}"

Based on your analysis and the user's instructions, generate a detailed prompt for a video generation AI. The video should be a compelling 15-second vertical video focused entirely on the influencer.

The output must be a single block of Markdown text.

The prompt must be structured exactly as follows:

**Video Concept:** A brief, engaging concept for a 15-second vertical video, based on the user-provided actions.

**Scene Description:** Describe the scene, setting, and the influencer's actions in detail. You must expand creatively on the user's input: "{actions}". Make it visually interesting and dynamic.

**Influencer Details:**
- **Appearance:** Describe the influencer's key visual characteristics from the image (hair color, style, facial features). The description must be photographic and precise to ensure an identical recreation.
- **Style:** Describe the influencer's clothing and overall style from the image.
- **Vibe:** Describe the influencer's mood or personality as perceived from the image and the requested actions (e.g., energetic, thoughtful, joyful).

**Shot List & Camera Angles:** Suggest 3-4 dynamic shots for the video that effectively capture the influencer's performance and the specified actions.

**Lighting:** Suggest a lighting style that complements the mood and actions (e.g., 'Golden hour lighting for a warm, happy feel', 'Bright, natural daylight for an authentic vibe').

**Dialogue/Speech:** Generate a short, natural-sounding line of dialogue **to be spoken *directly by the influencer***. The dialogue MUST be in **{language_name}**. It should be authentic, engaging, and relevant to the actions described.
"#
    )
}

/// System instruction for the prompt consistency audit.
pub const CONSISTENCY_SYSTEM_INSTRUCTION: &str = r#"You are a meticulous AI prompt auditor. Your task is to analyze the following prompt, which is intended for a video generation AI. Your sole focus is to determine if the prompt's descriptions will lead to a **visually consistent** output that is **identical** to the reference images it was based on.

Check for any ambiguity or creative language in the 'Influencer Details' and 'Product Details' sections that could cause the video AI to deviate from the source material. Pay special attention to the brand logo, colors, materials, design, and the influencer's appearance. The prompt must demand an exact, photorealistic match, not an 'inspired by' or 'similar to' version.

Based on your audit, respond with the specified JSON format indicating if the prompt is consistent and provide a brief reason for your assessment. If inconsistent, point out the specific part of the prompt that is ambiguous. A good prompt is one that leaves no room for creative interpretation on critical features."#;

/// JSON schema for the consistency audit response.
pub fn consistency_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "consistent": {
                "type": "BOOLEAN",
                "description": "Is the prompt free of ambiguities that could cause visual deviation from a reference image?"
            },
            "reason": {
                "type": "STRING",
                "description": "A brief explanation for the consistency rating. If inconsistent, identify the ambiguous part."
            }
        },
        "required": ["consistent", "reason"]
    })
}

/// Prompt for storyboard generation.
pub fn storyboard_prompt(premise: &str) -> String {
    format!(
        r#"You are a storyboard artist for short-form social video.
Break the following premise into 4 to 6 sequential scenes. For each scene provide a concise narrative description and a standalone, richly detailed image-generation prompt that depicts the scene.

Premise: "{premise}"

Keep the visual style consistent across every scene's image prompt."#
    )
}

/// JSON schema for the storyboard response.
pub fn storyboard_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "scene": { "type": "INTEGER", "description": "1-based scene number" },
                "description": { "type": "STRING", "description": "Narrative description of the scene" },
                "image_prompt": { "type": "STRING", "description": "Image-generation prompt for the scene" }
            },
            "required": ["scene", "description", "image_prompt"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_embed_language_name() {
        let t = video_prompt_template(LanguageCode::Pt);
        assert!(t.contains("Portuguese (Brazil)"));
        let t = product_ad_template(LanguageCode::Ja);
        assert!(t.contains("Japanese"));
    }

    #[test]
    fn test_influencer_template_embeds_actions() {
        let t = influencer_only_template("dancing in the rain", LanguageCode::En);
        assert!(t.contains("dancing in the rain"));
        assert!(t.contains("English"));
    }

    #[test]
    fn test_schemas_are_well_formed() {
        assert!(consistency_schema()["required"].is_array());
        assert_eq!(storyboard_schema()["type"], "ARRAY");
    }
}
