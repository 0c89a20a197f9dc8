use serde::Serialize;

use crate::core::shared::models::LessonType;
use crate::progress::estimate::{section_score, ToeicSection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Yeu,
    TrungBinh,
    Kha,
    Gioi,
    XuatSac,
}

impl Band {
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => Self::XuatSac,
            p if p >= 75.0 => Self::Gioi,
            p if p >= 60.0 => Self::Kha,
            p if p >= 40.0 => Self::TrungBinh,
            _ => Self::Yeu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XuatSac => "xuat_sac",
            Self::Gioi => "gioi",
            Self::Kha => "kha",
            Self::TrungBinh => "trung_binh",
            Self::Yeu => "yeu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::XuatSac => "Xuất sắc",
            Self::Gioi => "Giỏi",
            Self::Kha => "Khá",
            Self::TrungBinh => "Trung bình",
            Self::Yeu => "Yếu",
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            Self::XuatSac => "Bạn đã nắm vững kiến thức của bài học này. Hãy thử sức với bài khó hơn.",
            Self::Gioi => "Kết quả rất tốt. Chỉ còn vài lỗi nhỏ cần xem lại.",
            Self::Kha => "Bạn đã hiểu phần lớn nội dung nhưng vẫn còn một số điểm chưa chắc chắn.",
            Self::TrungBinh => "Bạn cần ôn tập thêm để củng cố kiến thức cơ bản.",
            Self::Yeu => "Kết quả còn thấp. Hãy học lại bài và làm lại bài tập.",
        }
    }
}

/// Study advice for one lesson type at one band.
pub fn recommendation(lesson_type: LessonType, band: Band) -> &'static str {
    use Band::*;
    use LessonType::*;

    match (lesson_type, band) {
        (Listening, XuatSac) => {
            "Thử nghe các bài giảng và bản tin tiếng Anh thực tế không có phụ đề."
        }
        (Listening, Gioi) => {
            "Luyện nghe với tốc độ nhanh hơn và thử các đoạn hội thoại dài (Part 3, Part 4)."
        }
        (Listening, Kha) => {
            "Luyện đoán nội dung trước khi nghe bằng cách đọc câu hỏi và các lựa chọn."
        }
        (Listening, TrungBinh) => {
            "Nghe lại bài kèm transcript, chú ý từ khóa và luyện nghe mỗi ngày 15-20 phút."
        }
        (Listening, Yeu) => {
            "Bắt đầu với Part 1 và Part 2, nghe chậm từng câu và chép chính tả."
        }
        (Reading, XuatSac) => {
            "Duy trì tốc độ đọc và luyện đề Part 7 đầy đủ trong 55 phút."
        }
        (Reading, Gioi) => {
            "Luyện đọc các đoạn văn kép và ba đoạn (Part 7) với giới hạn thời gian."
        }
        (Reading, Kha) => {
            "Tập kỹ năng đọc lướt tìm ý chính và đọc quét tìm thông tin chi tiết."
        }
        (Reading, TrungBinh) => {
            "Đọc các đoạn văn ngắn như email và thông báo, gạch chân thông tin chính."
        }
        (Reading, Yeu) => {
            "Củng cố từ vựng và ngữ pháp cơ bản trước khi luyện đọc hiểu."
        }
        (Grammar, XuatSac) => {
            "Luyện các câu Part 5 và Part 6 dễ gây nhầm lẫn để giữ độ chính xác cao."
        }
        (Grammar, Gioi) => {
            "Chuyển sang các câu hỏi ngữ pháp nâng cao như mệnh đề quan hệ và câu điều kiện."
        }
        (Grammar, Kha) => {
            "Ôn lại câu bị động, so sánh và các liên từ thường gặp trong Part 5."
        }
        (Grammar, TrungBinh) => {
            "Ôn lại các thì cơ bản, từ loại và cấu trúc câu thường gặp trong Part 5."
        }
        (Grammar, Yeu) => {
            "Học lại từ loại và cách chia động từ, làm bài tập ngắn mỗi ngày."
        }
        (Vocabulary, XuatSac) => {
            "Học thêm từ đồng nghĩa và cách diễn đạt tương đương xuất hiện trong đề thi."
        }
        (Vocabulary, Gioi) => {
            "Mở rộng vốn từ theo chủ đề kinh doanh và học thêm các cụm từ cố định."
        }
        (Vocabulary, Kha) => {
            "Ôn lại các từ đã sai và đặt câu ví dụ cho từng từ."
        }
        (Vocabulary, TrungBinh) => {
            "Học từ vựng theo chủ đề mỗi ngày và ôn lại bằng flashcard."
        }
        (Vocabulary, Yeu) => {
            "Bắt đầu với 600 từ TOEIC thông dụng, mỗi ngày 10-15 từ mới."
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub band: Band,
    pub band_label: &'static str,
    pub comment: &'static str,
    pub recommendation: Option<&'static str>,
    pub section: Option<ToeicSection>,
    pub estimated_section_score: Option<i32>,
}

/// Band, canned texts and the section score estimate for one percentage.
/// Unknown lesson types get no recommendation or estimate.
pub fn evaluate(lesson_type: &str, percentage: f64) -> Evaluation {
    let band = Band::from_percentage(percentage);
    let parsed = LessonType::parse(lesson_type);

    Evaluation {
        band,
        band_label: band.label(),
        comment: band.comment(),
        recommendation: parsed.map(|t| recommendation(t, band)),
        section: parsed.map(ToeicSection::from),
        estimated_section_score: parsed.map(|_| section_score(percentage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds() {
        assert_eq!(Band::from_percentage(100.0), Band::XuatSac);
        assert_eq!(Band::from_percentage(90.0), Band::XuatSac);
        assert_eq!(Band::from_percentage(89.99), Band::Gioi);
        assert_eq!(Band::from_percentage(75.0), Band::Gioi);
        assert_eq!(Band::from_percentage(60.0), Band::Kha);
        assert_eq!(Band::from_percentage(59.5), Band::TrungBinh);
        assert_eq!(Band::from_percentage(40.0), Band::TrungBinh);
        assert_eq!(Band::from_percentage(39.9), Band::Yeu);
        assert_eq!(Band::from_percentage(0.0), Band::Yeu);
    }

    #[test]
    fn test_band_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Band::TrungBinh).unwrap(), "trung_binh");
        assert_eq!(serde_json::to_value(Band::XuatSac).unwrap(), "xuat_sac");
        assert_eq!(Band::XuatSac.as_str(), "xuat_sac");
    }

    #[test]
    fn test_recommendation_depends_on_type_and_band() {
        let types = [
            LessonType::Listening,
            LessonType::Reading,
            LessonType::Grammar,
            LessonType::Vocabulary,
        ];
        let bands = [Band::Yeu, Band::TrungBinh, Band::Kha, Band::Gioi, Band::XuatSac];

        let mut seen = std::collections::HashSet::new();
        for lesson_type in types {
            for band in bands {
                assert!(seen.insert(recommendation(lesson_type, band)));
            }
        }
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_evaluate_grammar_maps_to_reading() {
        let eval = evaluate("grammar", 80.0);
        assert_eq!(eval.band, Band::Gioi);
        assert_eq!(eval.section, Some(ToeicSection::Reading));
        assert_eq!(eval.estimated_section_score, Some(397));
        assert!(eval.recommendation.is_some());
    }

    #[test]
    fn test_evaluate_unknown_type() {
        let eval = evaluate("speaking", 50.0);
        assert_eq!(eval.band, Band::TrungBinh);
        assert!(eval.recommendation.is_none());
        assert!(eval.estimated_section_score.is_none());
    }
}
