//! Static catalog of every tool and its prompt template.

use super::{Category, Choice, FieldKind, FieldSpec, OutputShape, Render, ToolDescriptor, ToolTemplate};

const CLASS_LEVELS: &[Choice] = &[
    Choice { value: "class-1", label: "Class 1" },
    Choice { value: "class-2", label: "Class 2" },
    Choice { value: "class-3", label: "Class 3" },
    Choice { value: "class-4", label: "Class 4" },
    Choice { value: "class-5", label: "Class 5" },
    Choice { value: "class-6", label: "Class 6" },
    Choice { value: "class-7", label: "Class 7" },
    Choice { value: "class-8", label: "Class 8" },
    Choice { value: "class-9", label: "Class 9" },
    Choice { value: "class-10", label: "Class 10" },
    Choice { value: "class-11", label: "Class 11" },
    Choice { value: "class-12", label: "Class 12" },
    Choice { value: "university", label: "University" },
];

const PARAGRAPH_WORDS: &[Choice] = &[
    Choice { value: "100", label: "100 words" },
    Choice { value: "200", label: "200 words" },
    Choice { value: "300", label: "300 words" },
    Choice { value: "400", label: "400 words" },
    Choice { value: "500", label: "500 words" },
];

const ESSAY_WORDS: &[Choice] = &[
    Choice { value: "300", label: "300 words" },
    Choice { value: "500", label: "500 words" },
    Choice { value: "600", label: "600 words" },
    Choice { value: "800", label: "800 words" },
];

const LETTER_TONES: &[Choice] = &[
    Choice { value: "formal", label: "Respectful Formal" },
    Choice { value: "friendly", label: "Friendly" },
];

const STANCES: &[Choice] = &[
    Choice { value: "for", label: "For the motion" },
    Choice { value: "against", label: "Against the motion" },
    Choice { value: "balanced", label: "Balanced view" },
];

const SPEECH_DURATIONS: &[Choice] = &[
    Choice { value: "short", label: "Short (2-3 min)" },
    Choice { value: "medium", label: "Medium (5-7 min)" },
    Choice { value: "long", label: "Long (10+ min)" },
];

const SUMMARY_STYLES: &[Choice] = &[
    Choice { value: "very-short", label: "Very Short" },
    Choice { value: "medium", label: "Medium" },
    Choice { value: "detailed", label: "Detailed but Simple" },
];

const COMPOSITION_STYLES: &[Choice] = &[
    Choice { value: "narrative", label: "Narrative" },
    Choice { value: "descriptive", label: "Descriptive" },
    Choice { value: "reflective", label: "Reflective" },
];

const CONTENT_TYPES: &[Choice] = &[
    Choice { value: "kids-story", label: "Kids Story" },
    Choice { value: "blog-post", label: "Blog Post" },
    Choice { value: "instagram-caption", label: "Instagram Caption" },
    Choice { value: "product-description", label: "Product Description" },
    Choice { value: "email", label: "Email" },
    Choice { value: "social-media", label: "Social Media Post" },
];

const AGE_GROUPS: &[Choice] = &[
    Choice { value: "3-5", label: "3-5 years" },
    Choice { value: "6-8", label: "6-8 years" },
    Choice { value: "9-12", label: "9-12 years" },
];

const BLOG_TONES: &[Choice] = &[
    Choice { value: "informative", label: "Informative" },
    Choice { value: "casual", label: "Casual" },
    Choice { value: "professional", label: "Professional" },
    Choice { value: "entertaining", label: "Entertaining" },
];

const CAPTION_STYLES: &[Choice] = &[
    Choice { value: "engaging", label: "Engaging" },
    Choice { value: "funny", label: "Funny" },
    Choice { value: "inspirational", label: "Inspirational" },
    Choice { value: "promotional", label: "Promotional" },
];

const TITLE_STYLES: &[Choice] = &[
    Choice { value: "clickbait", label: "Very Clickbait" },
    Choice { value: "professional", label: "Professional but Catchy" },
    Choice { value: "simple", label: "Simple and Clear" },
];

const VIDEO_TYPES: &[Choice] = &[
    Choice { value: "educational", label: "Educational" },
    Choice { value: "storytelling", label: "Storytelling" },
    Choice { value: "review", label: "Review" },
    Choice { value: "tutorial", label: "Tutorial" },
    Choice { value: "vlog", label: "Vlog Style" },
];

const VIDEO_LENGTHS: &[Choice] = &[
    Choice { value: "short", label: "Short Video (Under 5 min)" },
    Choice { value: "medium", label: "5-10 Minutes" },
    Choice { value: "long", label: "10-20 Minutes" },
];

const TAG_LANGUAGES: &[Choice] = &[
    Choice { value: "english", label: "English" },
    Choice { value: "hindi", label: "Hindi" },
    Choice { value: "bangla", label: "Bangla" },
    Choice { value: "spanish", label: "Spanish" },
    Choice { value: "arabic", label: "Arabic" },
];

const IMAGE_STYLES: &[Choice] = &[
    Choice { value: "", label: "None" },
    Choice { value: "realistic photo", label: "Realistic" },
    Choice { value: "anime style", label: "Anime" },
    Choice { value: "digital art", label: "Digital Art" },
    Choice { value: "watercolor painting", label: "Watercolor" },
    Choice { value: "oil painting", label: "Oil Painting" },
    Choice { value: "pencil sketch", label: "Sketch" },
    Choice { value: "3d render", label: "3D Render" },
    Choice { value: "cinematic lighting", label: "Cinematic" },
    Choice { value: "fantasy art", label: "Fantasy" },
    Choice { value: "minimalist", label: "Minimalist" },
];

const ASPECT_RATIOS: &[Choice] = &[
    Choice { value: "1:1", label: "Square (1:1)" },
    Choice { value: "3:4", label: "Portrait (3:4)" },
    Choice { value: "4:3", label: "Landscape (4:3)" },
    Choice { value: "9:16", label: "Story (9:16)" },
    Choice { value: "16:9", label: "Widescreen (16:9)" },
];

const fn text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { name, label, kind: FieldKind::Text { required: true }, render: Render::Value }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    options: &'static [Choice],
    default: &'static str,
    render: Render,
) -> FieldSpec {
    FieldSpec { name, label, kind: FieldKind::Choice { options, default }, render }
}

const CLASS_LEVEL: FieldSpec =
    choice("class_level", "Class Level", CLASS_LEVELS, "class-10", Render::ClassLevel);

const GRAMMAR_SYSTEM: &str = "You are a careful proofreader. You correct grammar, spelling and \
sentence structure without adding information or changing the meaning of the text.";

static TOOLS: &[ToolTemplate] = &[
    // --- student ---
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "application-writer",
            title: "Application Writer",
            description: "Formal applications with date, subject, salutation and sign-off",
            category: Category::Student,
        },
        fields: &[text("details", "Application Details")],
        body: "Write a formal application letter based on these details. Use academic and professional tone throughout.

Details: {details}

Requirements:
- Write a complete, well-structured application with proper formatting
- Include date, recipient details, subject line, salutation, body paragraphs, and closing
- Use formal and professional language
- Make the title/subject clear and prominent
- Include a proper sign-off",
        output: OutputShape::Prose,
        closing: Some("Respond with only the application letter, nothing else."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "letter-writer",
            title: "Letter Writer",
            description: "Formal or friendly letters with greeting, body and closing",
            category: Category::Student,
        },
        fields: &[
            text("details", "Letter Details"),
            choice("tone", "Tone", LETTER_TONES, "formal", Render::Value),
        ],
        body: "Write a {tone} letter based on these details:

{details}

Requirements:
- Write a complete letter with proper greeting, body paragraphs, and closing
- Use {tone} tone and language throughout
- Make it well-structured and professional
- Include appropriate salutation and sign-off",
        output: OutputShape::Prose,
        closing: Some("Respond with only the letter, nothing else."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "debate-writer",
            title: "Debate Writer",
            description: "Debate speeches for, against or balanced on a motion",
            category: Category::Student,
        },
        fields: &[
            text("topic", "Debate Topic"),
            CLASS_LEVEL,
            choice("stance", "Stance", STANCES, "for", Render::Stance),
        ],
        body: "Write a debate speech {stance} the motion: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary and complexity accordingly.

Requirements:
- Include a strong opening statement
- Present main arguments with supporting points
- Address counter-arguments with rebuttals
- End with a powerful conclusion
- Use vocabulary appropriate for {class_level} level
- Make key arguments prominent",
        output: OutputShape::Prose,
        closing: Some("Respond with only the debate speech, nothing else."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "speech-writer",
            title: "Speech Writer",
            description: "Speeches sized for a class level and delivery time",
            category: Category::Student,
        },
        fields: &[
            text("topic", "Speech Topic and Details"),
            CLASS_LEVEL,
            choice("duration", "Duration", SPEECH_DURATIONS, "medium", Render::Value),
        ],
        body: "Write a {duration} speech on: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary and complexity accordingly.

Requirements:
- Include an appropriate greeting for the occasion
- Write an engaging introduction
- Develop main content with clear points
- End with a memorable conclusion
- Use vocabulary suitable for {class_level}
- Make the speech engaging and appropriate for delivery",
        output: OutputShape::Prose,
        closing: Some("Respond with only the speech, nothing else."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "summary-generator",
            title: "Summary Generator",
            description: "Summaries of long text at a chosen depth",
            category: Category::Student,
        },
        fields: &[
            text("text", "Text to Summarize"),
            CLASS_LEVEL,
            choice("style", "Summary Style", SUMMARY_STYLES, "medium", Render::Value),
        ],
        body: "Summarize this text in a {style} way for a {class_level} student:

\"{text}\"

Requirements:
- Use vocabulary appropriate for {class_level}
- For lower classes, use very simple words and short sentences
- For university level, keep key technical terms but explain clearly
- Make the summary clear and easy to understand
- Highlight the main ideas",
        output: OutputShape::Prose,
        closing: Some("Respond with only the summary, nothing else."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "grammar-corrector",
            title: "Grammar Corrector",
            description: "Fixes grammar, spelling and sentence structure",
            category: Category::Student,
        },
        fields: &[text("text", "Text to Correct")],
        body: "Correct the grammar, spelling, and sentence structure of this text. Rewrite sentences to be clearer, more natural, and grammatically correct while keeping the original meaning:

\"{text}\"

Requirements:
- Fix all grammar and spelling errors
- Improve sentence structure for clarity
- Rewrite awkward sentences naturally
- Keep the original meaning and tone
- Start with \"Corrected Text\" as the heading",
        output: OutputShape::Prose,
        closing: Some("Respond with only the corrected text with the heading."),
        system: Some(GRAMMAR_SYSTEM),
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "paragraph-writer",
            title: "Paragraph Writer",
            description: "Single titled paragraphs of a chosen length",
            category: Category::Student,
        },
        fields: &[
            text("topic", "Topic and Details"),
            choice("word_count", "Word Count", PARAGRAPH_WORDS, "200", Render::Value),
            CLASS_LEVEL,
        ],
        body: "Write a well-structured paragraph of approximately {word_count} words on: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary and complexity accordingly.

Requirements:
- Start with a bold title for the paragraph
- Include a clear topic sentence
- Add supporting details and examples
- End with a concluding sentence
- Use vocabulary appropriate for {class_level}
- Make key words and phrases prominent",
        output: OutputShape::Prose,
        closing: Some("Respond with the title and paragraph only."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "essay-writer",
            title: "Essay Writer",
            description: "Essays with introduction, headed body paragraphs and conclusion",
            category: Category::Student,
        },
        fields: &[
            text("topic", "Topic and Instructions"),
            choice("word_count", "Word Count", ESSAY_WORDS, "500", Render::Value),
            CLASS_LEVEL,
        ],
        body: "Write a comprehensive essay of approximately {word_count} words on: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary and complexity accordingly.

Requirements:
- Start with a clear, bold title
- Include an Introduction paragraph with a heading
- Write 2-3 Body paragraphs, each with its own heading/name
- End with a Conclusion paragraph with heading
- Use vocabulary appropriate for {class_level}
- Make headings and key concepts prominent
- Include good transitions between paragraphs",
        output: OutputShape::Prose,
        closing: Some("Respond with the complete essay with all headings."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "composition-writer",
            title: "Composition Writer",
            description: "Narrative, descriptive or reflective compositions",
            category: Category::Student,
        },
        fields: &[
            text("topic", "Composition Topic"),
            CLASS_LEVEL,
            choice("style", "Style", COMPOSITION_STYLES, "narrative", Render::Value),
        ],
        body: "Write a {style} composition on: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary and complexity accordingly.

Requirements:
- Start with a bold title
- Write as flowing prose WITHOUT paragraph names or section headings
- For narrative style, use storytelling elements with characters and events
- For descriptive style, use vivid imagery and sensory details
- For reflective style, include personal thoughts and insights
- Use vocabulary appropriate for {class_level}
- Make the composition engaging and well-structured",
        output: OutputShape::Prose,
        closing: Some("Respond with only the title and composition as flowing paragraphs."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "story-generator",
            title: "Story Generator",
            description: "Stories with characters, climax and resolution",
            category: Category::Student,
        },
        fields: &[text("topic", "Story Topic and Details"), CLASS_LEVEL],
        body: "Write an engaging story based on: \"{topic}\"

This is for a {class_level} student. Adjust vocabulary, complexity, and themes accordingly.

Requirements:
- Start with an attention-grabbing title
- Write an engaging introduction that sets the scene
- Develop well-rounded characters
- Include rising action, climax, and resolution
- End with a satisfying conclusion, optionally with a moral or lesson
- Use vocabulary appropriate for {class_level}
- Make key moments and dialogue prominent",
        output: OutputShape::Prose,
        closing: Some("Respond with only the story with its title."),
        system: None,
    },
    // --- writer ---
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "content-writer",
            title: "Content Writer",
            description: "Blog posts, captions, product copy, emails and more",
            category: Category::Writer,
        },
        fields: &[
            text("details", "Details and Instructions"),
            choice("content_type", "Content Type", CONTENT_TYPES, "blog-post", Render::Label),
        ],
        body: "Write a {content_type} based on these details:

{details}

Requirements:
- Create high-quality, engaging content
- Make the title/heading prominent
- Use appropriate tone and style for {content_type}
- Make it well-structured and professional",
        output: OutputShape::Prose,
        closing: Some("Respond with only the content."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "kids-story",
            title: "Kids Story Writer",
            description: "Short, age-appropriate children stories with a moral",
            category: Category::Writer,
        },
        fields: &[
            text("topic", "Story Topic"),
            choice("age_group", "Age Group", AGE_GROUPS, "6-8", Render::Value),
        ],
        body: "Write an engaging children story for ages {age_group} about: \"{topic}\"

Requirements:
- Create a catchy, fun title
- Use age-appropriate vocabulary and sentence length
- Include colorful descriptions and lovable characters
- Make it imaginative and engaging
- Include a positive message or moral at the end
- Make key story moments exciting",
        output: OutputShape::Prose,
        closing: Some("Respond with only the story with its title."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "blog-post",
            title: "Blog Post Writer",
            description: "SEO-friendly blog posts with headline and call-to-action",
            category: Category::Writer,
        },
        fields: &[
            text("topic", "Blog Topic"),
            choice("tone", "Tone", BLOG_TONES, "informative", Render::Value),
        ],
        body: "Write an SEO-friendly blog post about: \"{topic}\"

Tone: {tone}

Requirements:
- Create a catchy headline/title
- Write an engaging introduction with a hook
- Structure the body with clear subheadings
- Include practical tips, insights, or information
- End with a strong conclusion and call-to-action
- Use {tone} tone throughout
- Make headings and key points prominent",
        output: OutputShape::Prose,
        closing: Some("Respond with the complete blog post."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "instagram-caption",
            title: "Instagram Caption",
            description: "Captions with a hook, call-to-action and hashtags",
            category: Category::Writer,
        },
        fields: &[
            text("description", "Post Description"),
            choice("style", "Style", CAPTION_STYLES, "engaging", Render::Value),
        ],
        body: "Write an {style} Instagram caption for: \"{description}\"

Requirements:
- Start with an attention-grabbing first line
- Write engaging body text that connects with the audience
- Include a call-to-action or question
- Add 5-10 relevant hashtags at the end
- Keep it concise but impactful
- Make it {style} and shareable",
        output: OutputShape::Prose,
        closing: Some("Respond with only the caption including hashtags."),
        system: None,
    },
    // --- social ---
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "youtube-title",
            title: "YouTube Title Generator",
            description: "Six search-optimized title ideas for a video",
            category: Category::Social,
        },
        fields: &[
            text("topic", "Topic or Current Title"),
            choice("style", "Title Style", TITLE_STYLES, "clickbait", Render::Label),
        ],
        body: "Generate 6 {style} YouTube video titles for: \"{topic}\"

Requirements:
- Make them attention-grabbing and click-worthy
- Each title should be unique and different
- Keep them under 60 characters ideally
- Make them optimized for YouTube search",
        output: OutputShape::Lines { count: 6, noun: "titles" },
        closing: None,
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "youtube-script",
            title: "YouTube Script Writer",
            description: "Recording-ready scripts from hook to outro",
            category: Category::Social,
        },
        fields: &[
            text("topic", "Video Topic and Details"),
            choice("video_type", "Video Type", VIDEO_TYPES, "educational", Render::Label),
            choice("length", "Video Length", VIDEO_LENGTHS, "medium", Render::Label),
        ],
        body: "Write a complete YouTube video script for a {video_type} video about: \"{topic}\"

Target length: {length}

Include these sections:
1. HOOK/INTRO - Grab attention in first 5 seconds
2. INTRODUCTION - Introduce the topic and yourself
3. MAIN CONTENT - Detailed content with clear segments
4. CALL TO ACTION - Ask viewers to like, subscribe, comment
5. OUTRO - End the video professionally

Requirements:
- Make section headings clear and prominent
- Include speaker cues like [PAUSE], [SHOW ON SCREEN], [B-ROLL] where appropriate
- Write in a conversational, engaging tone
- Make the script ready for recording",
        output: OutputShape::Prose,
        closing: Some("Respond with only the script."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "youtube-description",
            title: "YouTube Description Generator",
            description: "SEO descriptions with timestamps and hashtags",
            category: Category::Social,
        },
        fields: &[
            text("title", "Video Title"),
            FieldSpec {
                name: "keywords",
                label: "Keywords / Target Audience (Optional)",
                kind: FieldKind::Text { required: false },
                render: Render::Prefixed("Keywords/Audience: "),
            },
        ],
        body: "Create an SEO-friendly YouTube description for a video titled: \"{title}\"

{keywords}

Requirements:
- First 2 sentences should be compelling (shown in search results)
- Include a clear summary of video content
- Add a timestamps section placeholder
- Include call to action (subscribe, like, comment)
- Add social media links placeholder section
- End with 5-8 relevant hashtags
- Make it professional and engaging",
        output: OutputShape::Prose,
        closing: Some("Respond with only the description including hashtags."),
        system: None,
    },
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "youtube-tags",
            title: "YouTube Tag Generator",
            description: "20-25 broad and long-tail tags for a video",
            category: Category::Social,
        },
        fields: &[
            text("title", "Video Title or Keywords"),
            choice("language", "Language", TAG_LANGUAGES, "english", Render::Value),
        ],
        body: "Generate 20-25 SEO-friendly YouTube tags for a video about: \"{title}\"

Language for tags: {language}

Requirements:
- Mix of broad and specific tags
- Include trending related terms
- Include both short and long-tail keywords
- No special characters except necessary ones",
        output: OutputShape::Commas { noun: "tags" },
        closing: None,
        system: None,
    },
    // --- image ---
    ToolTemplate {
        descriptor: ToolDescriptor {
            id: "image-generator",
            title: "AI Image Generator",
            description: "Images from a description, with style and aspect ratio",
            category: Category::Image,
        },
        fields: &[
            text("prompt", "Image Description"),
            choice("style", "Style", IMAGE_STYLES, "", Render::Prefixed(", ")),
            choice("aspect_ratio", "Aspect Ratio", ASPECT_RATIOS, "1:1", Render::Orientation),
        ],
        body: "{prompt}{style}, high quality, detailed, 4k{aspect_ratio}",
        output: OutputShape::Image,
        closing: None,
        system: None,
    },
];

pub fn all_tools() -> &'static [ToolTemplate] {
    TOOLS
}

pub fn find_tool(id: &str) -> Option<&'static ToolTemplate> {
    let id = id.trim();
    TOOLS.iter().find(|t| t.descriptor.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_ids_are_unique() {
        let ids: HashSet<_> = TOOLS.iter().map(|t| t.descriptor.id).collect();
        assert_eq!(ids.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 19);
    }

    #[test]
    fn test_every_category_has_tools() {
        for category in Category::ALL {
            assert!(
                TOOLS.iter().any(|t| t.descriptor.category == category),
                "no tools in {}",
                category
            );
        }
    }

    #[test]
    fn test_choice_defaults_are_valid_options() {
        for template in TOOLS {
            for spec in template.fields {
                if let FieldKind::Choice { options, default } = spec.kind {
                    assert!(
                        options.iter().any(|c| c.value == default),
                        "{}.{} default '{}' missing",
                        template.descriptor.id,
                        spec.name,
                        default
                    );
                }
            }
        }
    }

    #[test]
    fn test_primary_field_is_required_text() {
        for template in TOOLS {
            assert_eq!(
                template.primary_field().kind,
                FieldKind::Text { required: true },
                "{}",
                template.descriptor.id
            );
        }
    }

    #[test]
    fn test_find_tool() {
        assert_eq!(find_tool("essay-writer").unwrap().descriptor.title, "Essay Writer");
        assert!(find_tool(" Essay-Writer ").is_some());
        assert!(find_tool("missing").is_none());
    }
}
