use super::{Prompts, QuestionType, Settings};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

const RECOMMENDATION_PROMPT: &str = r#"당신은 뛰어난 선물 추천 도우미입니다.

아래 사용자의 정보를 참고하여, "선물 키워드" 4개를 추천해주세요.
ex. 샤넬 지갑, 디올 어딕트 립글로우, 캐주얼 카드지갑, 애플 에어팟
- 키워드는 취향, 취미, 관심사 등 사용자의 취향을 반영하되 브랜드명이나, 카테고리 등을 포함한 구체적인 검색 키워드 작성
- 선물 대상과 상황을 고려해서 현실성 있게 추천
- 이전 답변들을 바탕으로 개인화된 추천 제공
- 각 키워드에 대하여 자연스럽고 친근한 어투로 간단한 설명 추가("~~이에요" 형식)
  - 사용자가 입력한 내용을 바탕으로 왜 그 선물이 매력적인지 알 수 있는 한줄평이어야 해줘.
  - 센스 넘치고 귀여운 말투! 이모티콘까지!!
  - 예: "이 선물이라면 음악을 좋아하는 여자친구가 무조건 좋아할만한 브랜드에요!😄"

사용자 정보:
{{현재까지답변}}

결과는 다음 JSON 형식으로 출력해주세요:
{
  "keywords": ["키워드1", "키워드2", "키워드3", "키워드4"],
  "descriptions": ["설명1", "설명2", "설명3", "설명4"]
}"#;

const NEXT_QUESTION_PROMPT: &str = r#"당신은 선물을 추천하는 귀여운 고양이!

지금까지 수집된 사용자 정보를 바탕으로, 다음 질문과 선택지를 생성해주세요.
- 질문은 이모티콘을 좋아하고 친구같은 반말 말투, 포근하고 다정한 분위기!
- 왜 선물을 하려는지, 선물할 때 고민되는 점은 뭔지, 사용자의 감정과 맥락을 고려한 질문.
- 선택지는 4-6개 정도로 제한
- 이전 답변을 고려하여 개인화된 선택지 제공
- 중복 질문은 피하기
- 선택지는 간결한 표현을 사용하되, 후반에는 좀더 구체적이고 현실적인 예시로 구성
- 선물 이유, 가격대 등이 파악되어야 함.

지금까지의 답변:
{{현재까지답변}}

결과는 다음 JSON 형식으로 출력해주세요:
{
  "question": "다음 질문",
  "description": "질문에 대한 설명",
  "chips": ["선택지1", "선택지2", ...]
}"#;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Bundled defaults, the lowest settings layer
pub fn default_settings() -> Settings {
    Settings {
        questions: strings(&[
            "누구한테 선물 줄 거야? 🐱",
            "예산은 얼마나 생각하고 있어? 💰",
            "이번 선물은 어떤 상황이야? 🎁",
            "그 분의 나이는 대략 몇 살쯤 돼? 👶👵",
            "요즘 그분이 좋아하거나 관심 있어 하는 게 뭐야? 🤔",
            "최근에 그분이 관심 보인 트렌드나 아이템 있어? 🛍️",
        ]),
        question_descriptions: strings(&[
            "",
            "예산을 알려주면 더 좋은 선물 추천해줄게! 😺",
            "",
            "",
            "최근에 얘기했던 주제나 카톡, SNS를 살펴보는 것도 좋을 거야! 📱",
            "최근에 산 물건이나 관심 보인 브랜드, 스타일 알려줘! 🛒",
        ]),
        question_types: vec![
            QuestionType::Normal,
            QuestionType::Normal,
            QuestionType::Normal,
            QuestionType::Ai,
            QuestionType::Ai,
            QuestionType::Ai,
        ],
        question_chips: vec![
            strings(&[
                "여자친구", "남자친구", "친한 친구", "직장 동료", "남편", "아내", "부모님", "아들",
                "딸", "선생님", "썸남", "썸녀",
            ]),
            strings(&[
                "1만원 이하",
                "1-3만원",
                "3-5만원",
                "5-10만원",
                "10-30만원",
                "30-50만원",
                "50만원 이상",
                "100만원 이상",
            ]),
            strings(&[
                "생일",
                "입사 축하",
                "감사 인사",
                "졸업",
                "기념일",
                "크리스마스",
                "발렌타인데이",
            ]),
            strings(&["10대", "20대", "30대", "40대", "50대 이상"]),
            strings(&["패션", "운동", "음악", "여행", "독서", "게임", "요리", "반려동물"]),
            strings(&[
                "최신 스마트폰",
                "에어팟",
                "명품 가방",
                "스포츠카",
                "캠핑용품",
                "요가 매트",
            ]),
        ],
        common_description: "자세히 입력하면 좀더 정확한 추천을 해줄게!".to_string(),
        model: DEFAULT_MODEL.to_string(),
        temperature: DEFAULT_TEMPERATURE,
        prompts: Prompts {
            recommendation_prompt: Some(RECOMMENDATION_PROMPT.to_string()),
            next_question_prompt: Some(NEXT_QUESTION_PROMPT.to_string()),
        },
    }
}
