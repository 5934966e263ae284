use crate::error::AppError;
use crate::keys::{FONT, LOGIN_BACKGROUND_IMAGE, LOGIN_OVERLAY_OPACITY};
use crate::models::LoginAppearance;
use crate::notify::Resource;
use crate::overrides::resolve;
use crate::repository::defaults::{DEFAULT_FONT, DEFAULT_OVERLAY_OPACITY};
use crate::repository::{ContentRepository, required};

fn clamp_opacity(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_OVERLAY_OPACITY
    }
}

impl ContentRepository {
    pub async fn login_appearance(&self) -> Result<LoginAppearance, AppError> {
        let background_image = self
            .read_raw(LOGIN_BACKGROUND_IMAGE)
            .await?
            .filter(|v| !v.trim().is_empty());
        let opacity = self
            .read_raw(LOGIN_OVERLAY_OPACITY)
            .await?
            .and_then(|raw| raw.trim().parse::<f32>().ok());

        Ok(LoginAppearance {
            background_image,
            overlay_opacity: clamp_opacity(resolve(opacity, None, DEFAULT_OVERLAY_OPACITY)),
        })
    }

    /// Clearing the image and writing the opacity land together or not at all.
    pub async fn set_login_appearance(&self, appearance: LoginAppearance) -> Result<LoginAppearance, AppError> {
        let opacity = clamp_opacity(appearance.overlay_opacity);
        let background_image = appearance
            .background_image
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let mut writes = vec![(LOGIN_OVERLAY_OPACITY.to_string(), opacity.to_string())];
        let mut removals = Vec::new();
        match &background_image {
            Some(image) => writes.push((LOGIN_BACKGROUND_IMAGE.to_string(), image.clone())),
            None => removals.push(LOGIN_BACKGROUND_IMAGE.to_string()),
        }

        self.store.apply(&writes, &removals).await?;
        let keys = writes.into_iter().map(|(k, _)| k).chain(removals).collect();
        self.publish(Resource::Settings, keys);

        Ok(LoginAppearance {
            background_image,
            overlay_opacity: opacity,
        })
    }

    pub async fn font(&self) -> Result<String, AppError> {
        let stored = self.read_raw(FONT).await?.filter(|f| !f.trim().is_empty());
        Ok(resolve(stored, None, DEFAULT_FONT.to_string()))
    }

    pub async fn set_font(&self, font: &str) -> Result<String, AppError> {
        let font = required(font, "font")?;
        self.commit(Resource::Settings, vec![(FONT.to_string(), font.clone())])
            .await?;
        Ok(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_opacity() {
        assert_eq!(clamp_opacity(1.7), 1.0);
        assert_eq!(clamp_opacity(-0.2), 0.0);
        assert_eq!(clamp_opacity(f32::NAN), DEFAULT_OVERLAY_OPACITY);
        assert_eq!(clamp_opacity(0.3), 0.3);
    }
}
