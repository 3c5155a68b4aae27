use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::domain::{Language, PhotoModel, UserBranding};

pub const DEFAULT_PRIMARY_COLOR: &str = "#000000";
pub const PRODUCT_NAME: &str = "ALECTRON";
pub const DEFAULT_CHECKLIST_TITLE: &str = "Checklist";

pub const STANDARD_PHOTOS: [&str; 8] = [
    "Frente",
    "Lateral Dianteira Direita",
    "Lateral Traseira Direita",
    "Traseira",
    "Lateral Traseira Esquerda",
    "Lateral Dianteira Esquerda",
    "Documentos",
    "Painel",
];

pub const PREMIUM_PHOTOS: [&str; 75] = [
    "Frente",
    "Lateral Dianteira Direita",
    "Lateral Traseira Direita",
    "Traseira",
    "Lateral Traseira Esquerda",
    "Lateral Dianteira Esquerda",
    "Painel (Meia Chave)",
    "Rádio/Mídia",
    "Bancos Dianteiros",
    "Bancos Traseiros",
    "Teto Externo",
    "Pneu Dianteiro Esquerdo",
    "Pneu Traseiro Esquerdo",
    "Pneu Traseiro Direito",
    "Pneu Dianteiro Direito",
    "Para-brisa",
    "Para-choque Dianteiro/Grades",
    "Capô Aberto",
    "Porta Dianteira Esquerda",
    "Porta Traseira Esquerda",
    "Para-choque Traseiro",
    "Tampa Traseira",
    "Porta-malas (Macaco/Triângulo)",
    "Bagagito/Suportes",
    "Porta Traseira Direita",
    "Porta Dianteira Direita",
    "Porta Traseira Direita (Detalhe)",
    "Motor",
    "Painel Instrumentos",
    "Para-choque Dianteiro (Detalhe)",
    "Para-choque Dianteiro (Detalhe 2)",
    "Para-choque Traseiro (Detalhe)",
    "Para-lama Direito",
    "Para-lama Esquerdo",
    "Placa Dianteira",
    "Placa Traseira",
    "Porta Dianteira Esq (Detalhe)",
    "Porta Dianteira Dir (Detalhe)",
    "Porta-malas (Visão Geral)",
    "Porta Traseira Esq (Detalhe)",
    "Protetor de Cárter",
    "Retrovisor Direito",
    "Retrovisor Esquerdo",
    "Revestimento Porta Diant Dir",
    "Revestimento Porta Diant Esq",
    "Roda Dianteira Esq",
    "Roda Dianteira Dir",
    "Tampa Traseira (Detalhe)",
    "Teto (Visão 1)",
    "Teto (Visão 2)",
    "Bagagito (Detalhe)",
    "Antena",
    "Ar Condicionado",
    "Manual do Proprietário",
    "Banco Traseiro (Detalhe 1)",
    "Banco Traseiro (Detalhe 2)",
    "Banco Traseiro (Detalhe 3)",
    "Bancos Dianteiros (Detalhe)",
    "Borracha Porta Diant Dir",
    "Borracha Porta Diant Esq",
    "Borracha Tampa Traseira",
    "Antena (Detalhe 2)",
    "Ar Condicionado (Saída)",
    "Manual (Aberto)",
    "Bancos Dianteiros (Assento)",
    "Borracha Porta Diant Esq (Det)",
    "Borracha Porta Diant Dir (Det)",
    "Borracha Tampa Tras (Det)",
    "Caixa de Ar Direita",
    "Caixa de Ar Esquerda",
    "Capô (Detalhe)",
    "Frisos de Teto",
    "Grade Para-choque Diant",
    "Lateral Traseira Dir (Detalhe)",
    "Lateral Traseira Esq (Detalhe)",
];

pub const INITIAL_CHECKLIST_ITEMS: [&str; 15] = [
    "Antena",
    "Calota",
    "Cartão Code",
    "Chave de Roda",
    "Chave do veículo",
    "Documentos",
    "Estepe",
    "Extintor",
    "Macaco",
    "Rádio",
    "Rádio Central Multimídia",
    "Rodas de Ferro",
    "Rodas de liga leve",
    "Tapetes",
    "Triângulo",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    data_url: String,
}

impl Logo {
    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    /// Raw image bytes. Accepts either a `data:<mime>;base64,` URL or bare base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = match self.data_url.split_once("base64,") {
            Some((_, payload)) => payload,
            None => self.data_url.as_str(),
        };
        STANDARD
            .decode(payload.trim())
            .context("logo is not valid base64")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header<'a> {
    Logo(&'a Logo),
    Label(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
    pub border: &'static str,
}

const LIGHT_PALETTE: Palette = Palette {
    background: "#ffffff",
    surface: "#ffffff",
    text: "#111827",
    muted_text: "#6b7280",
    border: "#e5e7eb",
};

const DARK_PALETTE: Palette = Palette {
    background: "#121212",
    surface: "#1e1e1e",
    text: "#e5e5e5",
    muted_text: "#a3a3a3",
    border: "#404040",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDescriptor {
    pub primary_color: String,
    pub is_dark_theme: bool,
    pub font_family: Option<String>,
    pub company_label: String,
    pub logo: Option<Logo>,
}

impl ThemeDescriptor {
    pub fn header(&self) -> Header<'_> {
        match &self.logo {
            Some(logo) => Header::Logo(logo),
            None => Header::Label(&self.company_label),
        }
    }

    pub fn palette(&self) -> Palette {
        if self.is_dark_theme {
            DARK_PALETTE
        } else {
            LIGHT_PALETTE
        }
    }
}

impl Default for ThemeDescriptor {
    fn default() -> Self {
        resolve_theme(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingPolicy {
    pub language: Language,
    pub checklist_title: String,
    pub checklist_locked: bool,
    pub allow_inspection_editing: bool,
    pub footer_text: Option<String>,
}

impl BrandingPolicy {
    pub fn checklist_items(&self) -> Vec<String> {
        INITIAL_CHECKLIST_ITEMS.iter().map(|s| s.to_string()).collect()
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

pub fn resolve_theme(branding: Option<&UserBranding>) -> ThemeDescriptor {
    let Some(branding) = branding else {
        return ThemeDescriptor {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            is_dark_theme: false,
            font_family: None,
            company_label: PRODUCT_NAME.to_string(),
            logo: None,
        };
    };

    ThemeDescriptor {
        primary_color: non_empty(branding.primary_color.as_ref())
            .unwrap_or(DEFAULT_PRIMARY_COLOR)
            .to_string(),
        is_dark_theme: branding.is_dark_theme.unwrap_or(false),
        font_family: non_empty(branding.font_family.as_ref()).map(str::to_string),
        company_label: non_empty(branding.company_name.as_ref())
            .unwrap_or(PRODUCT_NAME)
            .to_string(),
        logo: non_empty(branding.logo_base64.as_ref()).map(|data_url| Logo {
            data_url: data_url.to_string(),
        }),
    }
}

/// A custom list only wins when it has at least one entry.
pub fn resolve_photo_list(branding: Option<&UserBranding>) -> Vec<String> {
    let config = branding.and_then(|b| b.photo_config.as_ref());
    match config {
        Some(config) if config.model == PhotoModel::Premium => to_owned_list(&PREMIUM_PHOTOS),
        Some(config) if config.model == PhotoModel::Custom => match &config.active_photos {
            Some(active) if !active.is_empty() => active.clone(),
            _ => to_owned_list(&STANDARD_PHOTOS),
        },
        _ => to_owned_list(&STANDARD_PHOTOS),
    }
}

pub fn resolve_policy(branding: Option<&UserBranding>) -> BrandingPolicy {
    BrandingPolicy {
        language: branding.and_then(|b| b.language).unwrap_or_default(),
        checklist_title: branding
            .and_then(|b| non_empty(b.checklist_title.as_ref()))
            .unwrap_or(DEFAULT_CHECKLIST_TITLE)
            .to_string(),
        checklist_locked: branding
            .and_then(|b| b.is_checklist_locked)
            .unwrap_or(false),
        allow_inspection_editing: branding
            .and_then(|b| b.allow_inspection_editing)
            .unwrap_or(false),
        footer_text: branding
            .and_then(|b| non_empty(b.footer_text.as_ref()))
            .map(str::to_string),
    }
}

fn to_owned_list(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

#[cfg(test)]
#[path = "tests/branding_tests.rs"]
mod tests;
