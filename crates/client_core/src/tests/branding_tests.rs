use super::*;
use shared::domain::PhotoConfig;

fn branding_with_photos(model: PhotoModel, active: Option<Vec<&str>>) -> UserBranding {
    UserBranding {
        photo_config: Some(PhotoConfig {
            model,
            active_photos: active.map(|labels| labels.into_iter().map(String::from).collect()),
        }),
        ..UserBranding::default()
    }
}

#[test]
fn absent_branding_resolves_to_defaults() {
    let theme = resolve_theme(None);
    assert_eq!(theme.primary_color, DEFAULT_PRIMARY_COLOR);
    assert!(!theme.is_dark_theme);
    assert_eq!(theme.font_family, None);
    assert_eq!(theme.header(), Header::Label(PRODUCT_NAME));
    assert_eq!(theme.palette(), LIGHT_PALETTE);
}

#[test]
fn empty_strings_behave_like_absent_fields() {
    let branding = UserBranding {
        company_name: Some(String::new()),
        primary_color: Some(String::new()),
        font_family: Some("  ".to_string()),
        logo_base64: Some(String::new()),
        ..UserBranding::default()
    };
    assert_eq!(resolve_theme(Some(&branding)), resolve_theme(None));
}

#[test]
fn logo_replaces_company_label() {
    let branding = UserBranding {
        company_name: Some("Vistorias Sul".to_string()),
        logo_base64: Some("data:image/png;base64,aGVsbG8=".to_string()),
        primary_color: Some("#0a84ff".to_string()),
        is_dark_theme: Some(true),
        font_family: Some("Inter".to_string()),
        ..UserBranding::default()
    };

    let theme = resolve_theme(Some(&branding));
    assert_eq!(theme.primary_color, "#0a84ff");
    assert_eq!(theme.company_label, "Vistorias Sul");
    assert_eq!(theme.font_family.as_deref(), Some("Inter"));
    assert_eq!(theme.palette(), DARK_PALETTE);
    match theme.header() {
        Header::Logo(logo) => assert_eq!(logo.decode().expect("decode"), b"hello"),
        Header::Label(label) => panic!("expected logo, got label {label}"),
    }
}

#[test]
fn bare_base64_logo_decodes_and_garbage_is_an_error() {
    let theme = resolve_theme(Some(&UserBranding {
        logo_base64: Some("aGk=".to_string()),
        ..UserBranding::default()
    }));
    assert_eq!(theme.logo.as_ref().expect("logo").decode().expect("decode"), b"hi");

    let broken = resolve_theme(Some(&UserBranding {
        logo_base64: Some("data:image/png;base64,@@@".to_string()),
        ..UserBranding::default()
    }));
    assert!(broken.logo.expect("logo").decode().is_err());
}

#[test]
fn photo_list_is_never_empty() {
    let inputs = [
        None,
        Some(UserBranding::default()),
        Some(branding_with_photos(PhotoModel::Standard, None)),
        Some(branding_with_photos(PhotoModel::Standard, Some(vec!["Ignored"]))),
        Some(branding_with_photos(PhotoModel::Premium, None)),
        Some(branding_with_photos(PhotoModel::Custom, None)),
        Some(branding_with_photos(PhotoModel::Custom, Some(vec![]))),
        Some(branding_with_photos(PhotoModel::Custom, Some(vec!["Motor"]))),
    ];
    for branding in &inputs {
        assert!(
            !resolve_photo_list(branding.as_ref()).is_empty(),
            "empty photo list for {branding:?}"
        );
    }
}

#[test]
fn custom_list_is_returned_verbatim() {
    let labels = vec!["Traseira", "Motor", "Frente", "Motor"];
    let branding = branding_with_photos(PhotoModel::Custom, Some(labels.clone()));
    assert_eq!(resolve_photo_list(Some(&branding)), labels);
}

#[test]
fn empty_custom_list_falls_back_to_standard() {
    let branding = branding_with_photos(PhotoModel::Custom, Some(vec![]));
    let photos = resolve_photo_list(Some(&branding));
    assert_eq!(photos, STANDARD_PHOTOS.to_vec());
    assert_eq!(photos.len(), 8);
}

#[test]
fn premium_list_has_fixed_shape() {
    let photos = resolve_photo_list(Some(&branding_with_photos(PhotoModel::Premium, None)));
    assert_eq!(photos.len(), 75);
    assert_eq!(photos.first().map(String::as_str), Some("Frente"));
    assert_eq!(
        photos.last().map(String::as_str),
        Some("Lateral Traseira Esq (Detalhe)")
    );
}

#[test]
fn premium_ignores_tenant_active_photos() {
    let branding = branding_with_photos(PhotoModel::Premium, Some(vec!["Only this"]));
    assert_eq!(resolve_photo_list(Some(&branding)).len(), 75);
}

#[test]
fn policy_defaults_and_overrides() {
    let defaults = resolve_policy(None);
    assert_eq!(defaults.language, Language::Pt);
    assert_eq!(defaults.checklist_title, DEFAULT_CHECKLIST_TITLE);
    assert!(!defaults.checklist_locked);
    assert!(!defaults.allow_inspection_editing);
    assert_eq!(defaults.footer_text, None);
    assert_eq!(defaults.checklist_items().len(), INITIAL_CHECKLIST_ITEMS.len());

    let branding = UserBranding {
        language: Some(Language::Es),
        checklist_title: Some("Itens".to_string()),
        is_checklist_locked: Some(true),
        allow_inspection_editing: Some(true),
        footer_text: Some("CNPJ 00.000.000/0001-00".to_string()),
        ..UserBranding::default()
    };
    let policy = resolve_policy(Some(&branding));
    assert_eq!(policy.language, Language::Es);
    assert_eq!(policy.checklist_title, "Itens");
    assert!(policy.checklist_locked);
    assert!(policy.allow_inspection_editing);
    assert_eq!(
        policy.footer_text.as_deref(),
        Some("CNPJ 00.000.000/0001-00")
    );
}
