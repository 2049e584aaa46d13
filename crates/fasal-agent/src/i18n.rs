// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message catalogues for the chat channel.
//!
//! Full catalogues exist for English, Hindi, Tamil and Telugu; every other
//! language uses the English one. Language-set confirmations exist for all
//! nine supported languages.

use fasal_core::Language;

/// User-facing strings for one language.
#[derive(Debug)]
pub struct Catalog {
    pub result_header: &'static str,
    pub crop: &'static str,
    pub disease: &'static str,
    pub severity: &'static str,
    pub confidence: &'static str,
    pub description: &'static str,
    pub treatment: &'static str,
    pub dosage: &'static str,
    pub method: &'static str,
    pub cost: &'static str,
    pub per_acre: &'static str,
    pub organic: &'static str,
    pub prevention: &'static str,
    pub footer: &'static str,
    pub welcome: &'static str,
    pub help: &'static str,
    pub fallback: &'static str,
    pub image_error: &'static str,
    pub system_error: &'static str,
    /// Shown on results that come from the offline sample library.
    pub demo_notice: &'static str,
}

/// Reply used when a payload cannot be understood at all.
pub const BILINGUAL_APOLOGY: &str =
    "🙏 Something went wrong / कुछ गड़बड़ हो गई। Please try again / कृपया दोबारा कोशिश करें।";

const EN: Catalog = Catalog {
    result_header: "🌱 *FasalDrishti Analysis Result*",
    crop: "🌾 *Crop:*",
    disease: "🔍 *Disease:*",
    severity: "*Severity:*",
    confidence: "📊 *Confidence:*",
    description: "📝 *Description:*",
    treatment: "💊 *Recommended Treatment:*",
    dosage: "Dosage",
    method: "Method",
    cost: "Cost",
    per_acre: "/acre",
    organic: "🌿 *Organic Options:*",
    prevention: "🛡️ *Prevention:*",
    footer: "📸 Send another photo or type 'help'",
    welcome: "🌱 *Welcome to FasalDrishti, your AI Crop Doctor!*

I help identify crop diseases instantly.

📸 *How to use:*
1. Take a photo of the affected leaf or fruit
2. Send it here
3. Get in 30 seconds:
   ✅ Disease identification
   💊 Treatment advice
   💰 Cost per acre

🌾 *Supported crops:* Tomato, Rice, Wheat, Cotton, Potato, Chili, Onion

📸 Send a crop photo now!
🗣️ Type *lang* to change language",
    help: "🆘 *Help*

📸 *Photo tips:*
• Take a close-up of the affected leaf
• Use good lighting
• Send both front and back of the leaf

🗣️ *Change language:* Type *lang*",
    fallback: "🤖 I help identify crop diseases.

📸 Please send a *crop photo*.
Or type 'help' for assistance.
Or type *lang* to change language.",
    image_error: "🙏 Sorry, couldn't receive the photo. Please try again.",
    system_error: "🙏 Something went wrong. Please try again.",
    demo_notice: "⚠️ *Demo result:* the diagnosis service is unavailable, so this is a sample from our disease library. Please send the photo again later.",
};

const HI: Catalog = Catalog {
    result_header: "🌱 *FasalDrishti विश्लेषण परिणाम*",
    crop: "🌾 *फसल:*",
    disease: "🔍 *बीमारी:*",
    severity: "*गंभीरता:*",
    confidence: "📊 *विश्वास स्तर:*",
    description: "📝 *विवरण:*",
    treatment: "💊 *अनुशंसित उपचार:*",
    dosage: "खुराक",
    method: "विधि",
    cost: "खर्च",
    per_acre: "/एकड़",
    organic: "🌿 *जैविक विकल्प:*",
    prevention: "🛡️ *बचाव के उपाय:*",
    footer: "📸 एक और फोटो भेजें या 'help' टाइप करें",
    welcome: "🌱 *FasalDrishti, AI फसल डॉक्टर में आपका स्वागत है!*

मैं आपकी फसल की बीमारी तुरंत पहचानने में मदद करता हूं।

📸 *कैसे इस्तेमाल करें:*
1. प्रभावित पत्ती/फल की फोटो लें
2. यहां भेजें
3. 30 सेकंड में पाएं:
   ✅ बीमारी की पहचान
   💊 इलाज की सलाह
   💰 प्रति एकड़ खर्च

🌾 *समर्थित फसलें:* टमाटर, धान, गेहूं, कपास, आलू, मिर्च, प्याज

📸 अभी फसल की फोटो भेजें!
🗣️ भाषा बदलने के लिए *lang* टाइप करें",
    help: "🆘 *सहायता*

📸 *फोटो भेजने के टिप्स:*
• प्रभावित पत्ती को करीब से फोटो लें
• अच्छी रोशनी में फोटो लें
• पत्ती का आगे और पीछे दोनों तरफ भेजें

🗣️ *भाषा बदलें:* *lang* टाइप करें",
    fallback: "🤖 मैं आपकी फसल की बीमारी पहचानने में मदद करता हूं।

📸 कृपया अपनी *फसल की फोटो* भेजें।
या 'help' टाइप करें मदद के लिए।
या भाषा बदलने के लिए *lang* टाइप करें।",
    image_error: "🙏 माफ कीजिए, फोटो प्राप्त नहीं हो सकी। कृपया फिर से भेजें।",
    system_error: "🙏 कुछ गड़बड़ हो गई। कृपया दोबारा कोशिश करें।",
    demo_notice: "⚠️ *डेमो परिणाम:* निदान सेवा अभी उपलब्ध नहीं है, यह हमारी बीमारी सूची का एक नमूना है। कृपया बाद में फिर से फोटो भेजें।",
};

const TA: Catalog = Catalog {
    result_header: "🌱 *FasalDrishti பகுப்பாய்வு முடிவு*",
    crop: "🌾 *பயிர்:*",
    disease: "🔍 *நோய்:*",
    severity: "*தீவிரம்:*",
    confidence: "📊 *நம்பிக்கை:*",
    description: "📝 *விளக்கம்:*",
    treatment: "💊 *பரிந்துரைக்கப்பட்ட சிகிச்சை:*",
    dosage: "அளவு",
    method: "முறை",
    cost: "செலவு",
    per_acre: "/ஏக்கர்",
    organic: "🌿 *இயற்கை விருப்பங்கள்:*",
    prevention: "🛡️ *தடுப்பு:*",
    footer: "📸 மற்றொரு புகைப்படம் அனுப்பவும் அல்லது 'help' டைப் செய்யவும்",
    welcome: "🌱 *FasalDrishti, AI பயிர் மருத்துவர்!*\n\n📸 பாதிக்கப்பட்ட இலை/பழத்தின் புகைப்படம் அனுப்புங்கள்.\n30 வினாடிகளில் நோய் கண்டறிதல் + சிகிச்சை!\n\n🗣️ மொழி மாற்ற *lang* டைப் செய்யவும்",
    help: "🆘 *உதவி*\n\n📸 புகைப்படம் அனுப்பவும்\n🗣️ மொழி மாற்ற *lang* டைப் செய்யவும்",
    fallback: "📸 பயிர் புகைப்படம் அனுப்பவும் அல்லது 'help' டைப் செய்யவும்\n🗣️ மொழி மாற்ற *lang*",
    image_error: "🙏 புகைப்படம் பெற இயலவில்லை. மீண்டும் முயற்சிக்கவும்.",
    system_error: "🙏 ஏதோ தவறு நடந்தது. மீண்டும் முயற்சிக்கவும்.",
    demo_notice: "⚠️ *மாதிரி முடிவு:* நோய் கண்டறியும் சேவை இப்போது கிடைக்கவில்லை, இது எங்கள் நோய் பட்டியலிலிருந்து ஒரு மாதிரி. பின்னர் மீண்டும் புகைப்படம் அனுப்பவும்.",
};

const TE: Catalog = Catalog {
    result_header: "🌱 *FasalDrishti విశ్లేషణ ఫలితం*",
    crop: "🌾 *పంట:*",
    disease: "🔍 *వ్యాధి:*",
    severity: "*తీవ్రత:*",
    confidence: "📊 *నమ్మకం:*",
    description: "📝 *వివరణ:*",
    treatment: "💊 *సిఫార్సు చేసిన చికిత్స:*",
    dosage: "మోతాదు",
    method: "పద్ధతి",
    cost: "ఖర్చు",
    per_acre: "/ఎకరం",
    organic: "🌿 *సేంద్రీయ ఎంపికలు:*",
    prevention: "🛡️ *నివారణ:*",
    footer: "📸 మరో ఫోటో పంపండి లేదా 'help' టైప్ చేయండి",
    welcome: "🌱 *FasalDrishti, AI పంట వైద్యుడు!*\n\n📸 ప్రభావిత ఆకు/పండు ఫోటో పంపండి.\n30 సెకన్లలో వ్యాధి నిర్ధారణ + చికిత్స!\n\n🗣️ భాష మార్చడానికి *lang* టైప్ చేయండి",
    help: "🆘 *సహాయం*\n\n📸 ఫోటో పంపండి\n🗣️ భాష మార్చడానికి *lang* టైప్ చేయండి",
    fallback: "📸 పంట ఫోటో పంపండి లేదా 'help' టైప్ చేయండి\n🗣️ భాష మార్చడానికి *lang*",
    image_error: "🙏 ఫోటో అందలేదు. మళ్ళీ ప్రయత్నించండి.",
    system_error: "🙏 ఏదో తప్పు జరిగింది. మళ్ళీ ప్రయత్నించండి.",
    demo_notice: "⚠️ *నమూనా ఫలితం:* నిర్ధారణ సేవ ఇప్పుడు అందుబాటులో లేదు, ఇది మా వ్యాధి జాబితా నుండి ఒక నమూనా. దయచేసి తర్వాత మళ్ళీ ఫోటో పంపండి.",
};

/// Catalogue for `language`, English when none was authored.
pub fn catalog(language: Language) -> &'static Catalog {
    match language {
        Language::Hi => &HI,
        Language::Ta => &TA,
        Language::Te => &TE,
        _ => &EN,
    }
}

/// Menu number of `language`, 1-based.
pub fn selector_of(language: Language) -> usize {
    Language::ALL
        .iter()
        .position(|l| *l == language)
        .map_or(1, |i| i + 1)
}

/// Parses a menu selector ("1".."9").
pub fn parse_selector(text: &str) -> Option<Language> {
    let n: usize = text.trim().parse().ok()?;
    n.checked_sub(1).and_then(|i| Language::ALL.get(i)).copied()
}

fn flag(language: Language) -> &'static str {
    match language {
        Language::En => "🇬🇧",
        _ => "🇮🇳",
    }
}

/// Bilingual language menu shown to new users.
pub fn language_menu() -> String {
    let mut menu = String::from(
        "🌱 *Welcome to FasalDrishti!*\n🌱 *FasalDrishti में आपका स्वागत है!*\n\n\
🗣️ *Please choose your language / अपनी भाषा चुनें:*\n\n",
    );
    for language in Language::ALL {
        menu.push_str(&format!(
            "{}. {} {} ({})\n",
            selector_of(language),
            flag(language),
            language.native_name(),
            language.english_name()
        ));
    }
    menu.push_str(
        "\n👉 *Reply with the number (1-9)*\n👉 *नंबर भेजें (1-9)*\n\nExample: Send *2* for हिंदी",
    );
    menu
}

/// Confirmation sent after a language is selected.
pub fn confirmation(language: Language) -> &'static str {
    match language {
        Language::En => "✅ Language set to *English*

🌱 *Welcome to FasalDrishti, your AI Crop Doctor!*

I help you identify crop diseases instantly.

📸 *How to use:*
1. Take a photo of the affected leaf or fruit
2. Send it here on WhatsApp
3. Get in 30 seconds:
   ✅ Disease identification
   💊 Treatment advice
   💰 Cost per acre

🌾 *Supported crops:* Tomato, Rice, Wheat, Cotton, Potato, Chili, Onion

📸 Send a crop photo now to get started!

🗣️ Type *lang* anytime to change language",
        Language::Hi => "✅ भाषा *हिंदी* सेट हो गई

🌱 *FasalDrishti, AI फसल डॉक्टर में आपका स्वागत है!*

मैं आपकी फसल की बीमारी तुरंत पहचानने में मदद करता हूं।

📸 *कैसे इस्तेमाल करें:*
1. प्रभावित पत्ती/फल की फोटो लें
2. यहां WhatsApp पर भेजें
3. 30 सेकंड में पाएं:
   ✅ बीमारी की पहचान
   💊 इलाज की सलाह
   💰 प्रति एकड़ खर्च

🌾 *समर्थित फसलें:* टमाटर, धान, गेहूं, कपास, आलू, मिर्च, प्याज

📸 अभी फसल की फोटो भेजें!

🗣️ भाषा बदलने के लिए *lang* टाइप करें",
        Language::Ta => "✅ மொழி *தமிழ்* அமைக்கப்பட்டது\n\n🌱 *FasalDrishti, AI பயிர் மருத்துவர்!*\n\n📸 பாதிக்கப்பட்ட இலை/பழத்தின் புகைப்படம் அனுப்புங்கள்.\n30 வினாடிகளில் நோய் கண்டறிதல் + சிகிச்சை பெறுங்கள்!\n\n🗣️ மொழி மாற்ற *lang* டைப் செய்யவும்",
        Language::Te => "✅ భాష *తెలుగు* సెట్ చేయబడింది\n\n🌱 *FasalDrishti, AI పంట వైద్యుడు!*\n\n📸 ప్రభావిత ఆకు/పండు ఫోటో పంపండి.\n30 సెకన్లలో వ్యాధి నిర్ధారణ + చికిత్స పొందండి!\n\n🗣️ భాష మార్చడానికి *lang* టైప్ చేయండి",
        Language::Kn => "✅ ಭಾಷೆ *ಕನ್ನಡ* ಹೊಂದಿಸಲಾಗಿದೆ\n\n🌱 *FasalDrishti, AI ಬೆಳೆ ವೈದ್ಯ!*\n\n📸 ಪೀಡಿತ ಎಲೆ/ಹಣ್ಣಿನ ಫೋಟೋ ಕಳುಹಿಸಿ.\n30 ಸೆಕೆಂಡುಗಳಲ್ಲಿ ರೋಗ ಪತ್ತೆ + ಚಿಕಿತ್ಸೆ ಪಡೆಯಿರಿ!\n\n🗣️ ಭಾಷೆ ಬದಲಿಸಲು *lang* ಟೈಪ್ ಮಾಡಿ",
        Language::Bn => "✅ ভাষা *বাংলা* সেট হয়েছে\n\n🌱 *FasalDrishti, AI ফসল ডাক্তার!*\n\n📸 আক্রান্ত পাতা/ফলের ছবি পাঠান।\n30 সেকেন্ডে রোগ নির্ণয় + চিকিৎসা পান!\n\n🗣️ ভাষা পরিবর্তন করতে *lang* টাইপ করুন",
        Language::Mr => "✅ भाषा *मराठी* सेट झाली\n\n🌱 *FasalDrishti, AI पीक डॉक्टर!*\n\n📸 प्रभावित पानाचा/फळाचा फोटो पाठवा.\n30 सेकंदात रोग ओळख + उपचार मिळवा!\n\n🗣️ भाषा बदलण्यासाठी *lang* टाइप करा",
        Language::Pa => "✅ ਭਾਸ਼ਾ *ਪੰਜਾਬੀ* ਸੈੱਟ ਹੋ ਗਈ\n\n🌱 *FasalDrishti, AI ਫ਼ਸਲ ਡਾਕਟਰ!*\n\n📸 ਪ੍ਰਭਾਵਿਤ ਪੱਤੇ/ਫਲ ਦੀ ਫੋਟੋ ਭੇਜੋ।\n30 ਸਕਿੰਟਾਂ ਵਿੱਚ ਰੋਗ ਪਛਾਣ + ਇਲਾਜ ਪ੍ਰਾਪਤ ਕਰੋ!\n\n🗣️ ਭਾਸ਼ਾ ਬਦਲਣ ਲਈ *lang* ਟਾਈਪ ਕਰੋ",
        Language::Gu => "✅ ભાષા *ગુજરાતી* સેટ થઈ\n\n🌱 *FasalDrishti, AI પાક ડૉક્ટર!*\n\n📸 અસરગ્રસ્ત પાન/ફળનો ફોટો મોકલો.\n30 સેકન્ડમાં રોગ ઓળખ + સારવાર મેળવો!\n\n🗣️ ભાષા બદલવા *lang* ટાઈપ કરો",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_map_in_menu_order() {
        assert_eq!(parse_selector("1"), Some(Language::En));
        assert_eq!(parse_selector(" 2 "), Some(Language::Hi));
        assert_eq!(parse_selector("9"), Some(Language::Gu));
        assert_eq!(parse_selector("0"), None);
        assert_eq!(parse_selector("10"), None);
        assert_eq!(parse_selector("two"), None);
        for language in Language::ALL {
            assert_eq!(parse_selector(&selector_of(language).to_string()), Some(language));
        }
    }

    #[test]
    fn menu_lists_every_language() {
        let menu = language_menu();
        for language in Language::ALL {
            assert!(menu.contains(language.native_name()), "missing {language}");
        }
        assert!(menu.contains("2. 🇮🇳 हिंदी (Hindi)"));
    }

    #[test]
    fn untranslated_languages_use_english_catalog() {
        assert_eq!(catalog(Language::Gu).welcome, catalog(Language::En).welcome);
        assert_ne!(catalog(Language::Hi).welcome, catalog(Language::En).welcome);
    }

    #[test]
    fn every_language_has_its_own_confirmation() {
        let mut seen = std::collections::HashSet::new();
        for language in Language::ALL {
            let text = confirmation(language);
            assert!(text.starts_with('✅'));
            assert!(seen.insert(text));
        }
    }
}
