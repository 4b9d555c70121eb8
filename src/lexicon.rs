//! Static keyword lexicon for tag extraction.
//!
//! Pure data: category → tag name → keyword list, the MBTI keyword tables, a
//! word-level sentiment map and the intensifier list used by emotion scoring.
//! Keyword data is predominantly Chinese with mixed-in net slang and latin
//! acronyms, matching the conversations the engine profiles.

use crate::profile::TagCategory;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One tag with its trigger keywords.
pub type TagKeywords = (&'static str, &'static [&'static str]);

pub static INTEREST: &[TagKeywords] = &[
    ("技术", &[
        "编程", "代码", "开发", "软件", "算法", "数据库", "框架", "网站", "工程",
        "前端", "后端", "全栈", "调试", "部署", "开源", "nlp", "ai", "折腾",
    ]),
    ("阅读", &[
        "书籍", "小说", "文学", "阅读", "作者", "故事", "读书", "kindle", "听书",
        "书单", "书评", "网文", "轻小说", "科幻", "悬疑", "推理",
    ]),
    ("电影", &[
        "电影", "影片", "导演", "演员", "剧情", "观影", "影院", "电视剧", "豆瓣",
        "影评", "综艺", "追剧", "刷剧", "番剧", "漫威", "netflix",
    ]),
    ("音乐", &[
        "音乐", "歌曲", "歌手", "乐队", "听歌", "旋律", "节奏", "演唱会", "rap",
        "嘻哈", "古典乐", "摇滚", "民谣", "电音", "歌单", "live", "说唱",
    ]),
    ("游戏", &[
        "游戏", "玩家", "电竞", "通关", "副本", "手游", "主机", "steam", "氪金",
        "开黑", "联机", "单机", "fps", "moba", "rpg", "抽卡", "ps5",
    ]),
    ("体育", &[
        "运动", "健身", "篮球", "足球", "跑步", "锻炼", "比赛", "球员", "健身房",
        "撸铁", "瑜伽", "球鞋", "训练", "马拉松", "心率",
    ]),
    ("旅行", &[
        "旅游", "旅行", "景点", "出游", "度假", "目的地", "行程", "攻略", "打卡",
        "民宿", "酒店", "机票", "签证", "探店", "风景",
    ]),
    ("美食", &[
        "美食", "美味", "餐厅", "菜品", "烹饪", "食谱", "厨艺", "外卖", "吃播",
        "料理", "甜品", "火锅", "烧烤", "米其林", "宵夜",
    ]),
    ("摄影", &[
        "摄影", "照片", "相机", "镜头", "构图", "拍照", "修图", "单反", "微单",
        "后期", "光圈", "快门", "曝光", "胶片",
    ]),
    ("艺术", &[
        "艺术", "绘画", "画家", "设计", "创作", "展览", "美术", "插画", "水彩",
        "素描", "画廊", "当代艺术", "博物馆", "美学",
    ]),
    ("科学", &[
        "科学", "物理", "化学", "生物", "研究", "实验", "理论", "科普", "论文",
        "天文", "宇宙", "分子", "粒子", "进化",
    ]),
    ("二次元", &[
        "动漫", "漫画", "宅", "二次元", "acg", "coser", "cos", "手办", "周边",
        "声优", "同人", "看番", "补番", "萌", "日语",
    ]),
    ("数码", &[
        "数码", "科技", "测评", "拆解", "配置", "参数", "性价比", "新机", "上手",
        "入手", "首发", "刷机", "root",
    ]),
    ("职场", &[
        "工作", "简历", "面试", "求职", "跳槽", "职场", "同事", "上司", "老板",
        "晋升", "薪资", "绩效", "裁员", "副业",
    ]),
    ("理财", &[
        "理财", "投资", "基金", "股票", "定投", "收益", "财务", "资产", "存款",
        "贷款", "房贷", "大盘", "指数", "抄底",
    ]),
    ("心理", &[
        "心理", "情绪", "压力", "焦虑", "疗愈", "咨询", "放松", "倦怠", "倾诉",
        "边界感", "自我", "成长",
    ]),
];

pub static KNOWLEDGE: &[TagKeywords] = &[
    ("计算机科学", &[
        "编程语言", "软件开发", "数据结构", "操作系统", "计算机网络", "编译原理",
        "系统架构", "云计算", "分布式系统", "git", "微服务", "容器化", "devops",
    ]),
    ("人工智能", &[
        "机器学习", "深度学习", "神经网络", "自然语言处理", "计算机视觉", "大模型",
        "llm", "chatgpt", "claude", "prompt", "embedding", "多模态", "rag",
    ]),
    ("互联网创业", &[
        "创业", "融资", "风投", "商业模式", "用户增长", "产品经理", "mvp",
        "天使轮", "独角兽", "估值", "变现", "增长黑客", "ab测试",
    ]),
    ("新媒体", &[
        "自媒体", "短视频", "内容创作", "kol", "种草", "直播带货", "电商",
        "抖音", "小红书", "b站", "公众号", "私域流量", "爆文",
    ]),
    ("心理学", &[
        "认知行为", "潜意识", "心理疗法", "人格类型", "mbti", "九型人格",
        "心理测试", "心理咨询", "情绪管理", "自我实现", "心流状态",
    ]),
    ("设计", &[
        "ui设计", "ux设计", "交互设计", "用户体验", "视觉设计", "平面设计",
        "设计系统", "用户调研", "原型设计", "信息架构", "wireframe",
    ]),
    ("数据分析", &[
        "统计", "数据挖掘", "数据可视化", "大数据", "预测模型", "数据仓库",
        "etl", "埋点", "sql", "归因", "指标",
    ]),
    ("金融", &[
        "金融市场", "经济学", "证券", "期货", "外汇", "债券", "量化交易",
        "风险管理", "资产配置", "财务报表", "宏观经济", "市盈率",
    ]),
    ("医学", &[
        "医疗", "疾病", "治疗", "药物", "临床", "症状", "诊断", "生理学",
        "病理学", "公共卫生", "预防医学",
    ]),
    ("法律", &[
        "法规", "法院", "诉讼", "合同", "法律条款", "民法", "刑法", "知识产权",
        "合规", "仲裁", "判例",
    ]),
    ("文学", &[
        "文学史", "文学评论", "写作技巧", "文学流派", "叙事", "小说创作",
        "诗歌", "散文", "戏剧", "修辞", "文学理论",
    ]),
    ("历史", &[
        "历史事件", "历史人物", "考古", "文明", "朝代", "帝国", "革命",
        "文化演变", "社会变迁", "史料", "史观",
    ]),
];

pub static PERSONALITY: &[TagKeywords] = &[
    ("躺平", &["躺平", "不卷", "摆烂", "佛系", "咸鱼", "不内卷", "不上进"]),
    ("丧", &["丧", "难过", "抑郁", "悲伤", "消极", "压抑", "绝望", "无助"]),
    ("社恐", &["社恐", "不敢社交", "害怕人群", "社交恐惧", "不会聊天", "尴尬", "紧张"]),
    ("拖延", &["拖延", "deadline", "ddl", "最后一刻", "熬夜赶工", "一直拖"]),
    ("自律", &["自律", "早起", "健身", "冥想", "规划", "时间管理", "效率", "专注"]),
    ("强迫症", &["强迫症", "完美主义", "必须整齐", "反复检查", "对称", "洁癖"]),
    ("佛系", &["佛系", "随缘", "看开", "不强求", "淡然", "无所谓", "看淡", "洒脱"]),
    ("精致", &["精致", "讲究", "品质", "小确幸", "高质量", "仪式感"]),
    ("清醒", &["清醒", "理性", "客观", "冷静", "理智", "看透", "不盲从", "独立思考"]),
    ("人来疯", &["人来疯", "社牛", "社交达人", "爱社交", "交际花", "活跃", "自来熟"]),
    ("耐心", &["细致", "慢慢来", "不着急", "仔细", "一步一步", "耐心", "详细"]),
    ("急躁", &["快点", "赶紧", "马上", "立刻", "等不及", "烦躁", "着急", "不耐烦"]),
    ("好奇", &["为什么", "怎么会", "原理是", "想知道", "好奇", "求知欲", "探索"]),
    ("谨慎", &["小心", "注意风险", "保守", "安全第一", "三思", "谨慎", "稳妥"]),
    ("乐观", &["积极", "向好", "没问题", "会成功", "相信", "乐观", "阳光", "正能量"]),
    ("悲观", &["担心", "恐怕", "不行", "难以", "困难", "悲观", "负面", "不可能"]),
];

pub static COMMUNICATION: &[TagKeywords] = &[
    ("直接", &["直接", "开门见山", "单刀直入", "简单明了", "直白", "有话直说"]),
    ("委婉", &["委婉", "或许", "可能", "建议", "如果方便", "不好意思", "麻烦", "希望"]),
    ("口语化", &["口语", "聊天", "闲聊", "日常", "轻松", "不正式", "随意", "生活化"]),
    ("网络用语", &[
        "xswl", "yyds", "绝绝子", "awsl", "dbq", "yysy", "emo", "u1s1", "zqsg",
        "bdjw", "ssfd", "yygq", "班味", "松弛感", "硬控",
    ]),
    ("表情包", &["表情包", "斗图", "jpg", "动图", "gif", "问号脸", "破防", "麻了"]),
    ("学术", &["学术", "专业", "严谨", "规范", "引用", "文献", "资料", "专业术语"]),
    ("吐槽", &["吐槽", "槽点", "批评", "diss", "喷", "怼", "杠", "阴阳怪气"]),
    ("整活", &["整活", "搞笑", "沙雕", "离谱", "魔性", "社死", "抽象", "蚌埠住了", "绷不住"]),
    ("详细", &["详细", "具体", "详尽", "全面", "完整", "深入", "细节", "展开", "解释"]),
    ("简洁", &["简洁", "简单", "短", "精简", "直奔主题", "重点", "快速", "不啰嗦"]),
    ("幽默", &["搞笑", "幽默", "笑话", "风趣", "调侃", "逗趣", "段子", "梗", "有趣"]),
    ("严肃", &["严肃", "认真", "不开玩笑", "正经", "务实", "严格", "一本正经"]),
];

pub static EMOTION: &[TagKeywords] = &[
    ("内耗", &["内耗", "自我怀疑", "自责", "不够好", "无力感", "压力山大", "喘不过气"]),
    ("emo", &["emo", "情绪低落", "心情不好", "难过", "郁闷", "down", "难受", "心塞"]),
    ("破防", &["破防", "崩溃", "绷不住", "瞬间泪目", "感动", "流泪", "泪奔", "震惊"]),
    ("麻了", &["麻了", "无语", "窒息", "无言", "无法理解", "裂开", "傻眼"]),
    ("快乐", &["快乐", "开心", "幸福", "愉悦", "心情大好", "嗨", "兴奋", "激动", "雀跃"]),
    ("燃起来了", &["燃起来了", "激励", "振奋", "热血", "动力", "激情", "斗志"]),
    ("酸了", &["酸了", "羡慕", "嫉妒", "柠檬精", "吃醋", "眼红"]),
    ("积极", &["开心", "快乐", "高兴", "兴奋", "愉悦", "开朗", "活力", "乐观", "阳光"]),
    ("焦虑", &["担忧", "害怕", "恐惧", "忧虑", "不安", "紧张", "慌张", "压力", "惊慌"]),
    ("愤怒", &["生气", "恼火", "愤怒", "火大", "烦躁", "发火", "暴怒", "气愤", "不爽"]),
    ("忧郁", &["伤心", "难过", "悲伤", "失落", "消沉", "郁闷", "沮丧", "痛苦", "低落"]),
    ("平静", &["平静", "冷静", "沉着", "稳定", "镇定", "安宁", "平和", "淡定", "从容"]),
];

pub static VALUE: &[TagKeywords] = &[
    ("躺平主义", &["躺平", "不卷", "摆烂", "不上进", "不买房", "不结婚", "降低欲望"]),
    ("平等意识", &["平等", "权利", "权益", "歧视", "偏见", "刻板印象", "性别平等"]),
    ("可持续生活", &[
        "环保", "可持续", "节能", "低碳", "垃圾分类", "气候变化", "二手", "闲置",
        "极简主义",
    ]),
    ("个人成长", &[
        "成长", "自我提升", "终身学习", "反思", "复盘", "目标", "计划", "习惯",
        "自我管理",
    ]),
    ("数字极简", &[
        "数字排毒", "数字极简", "断舍离", "戒网瘾", "深度工作", "信息焦虑",
        "隐私保护",
    ]),
    ("科技伦理", &["科技伦理", "ai伦理", "数据隐私", "算法偏见", "数字鸿沟", "信息茧房"]),
];

pub static SUBCULTURE: &[TagKeywords] = &[
    ("二次元", &[
        "动漫", "漫画", "宅", "二次元", "acg", "coser", "cos", "手办", "萌",
        "声优", "vtuber", "虚拟主播", "切片",
    ]),
    ("古风", &[
        "汉服", "国风", "古风", "仙侠", "古装", "传统文化", "戏曲", "国学",
        "诗词", "文言文", "古琴", "书法",
    ]),
    ("键政", &["政治", "时事", "国际关系", "政策", "体制", "改革", "阶级", "资本"]),
    ("科幻", &[
        "科幻", "星际", "太空", "未来", "机器人", "赛博朋克", "反乌托邦",
        "平行宇宙", "穿越",
    ]),
    ("电竞", &[
        "电竞", "赛事", "职业选手", "战队", "解说", "赛季", "排位", "天梯",
        "kda", "rank", "上分", "gank",
    ]),
    ("独立音乐", &[
        "独立音乐", "地下音乐", "民谣", "后摇", "lofi", "小众", "livehouse",
        "音乐节", "巡演", "编曲", "乐评",
    ]),
    ("健身", &[
        "健身", "肌肉", "力量", "增肌", "减脂", "塑形", "体脂率", "蛋白质",
        "碳水", "撸铁", "马甲线",
    ]),
    ("潮流", &[
        "潮流", "街头", "球鞋", "sneaker", "潮牌", "限量", "联名", "滑板",
        "复古", "vintage",
    ]),
];

pub static TOPIC: &[TagKeywords] = &[
    ("人际关系", &["人际", "社交", "朋友", "关系", "交往", "相处", "沟通", "交流", "友谊"]),
    ("职业发展", &["职业", "职场", "工作", "事业", "升职", "加薪", "跳槽", "求职", "面试", "简历"]),
    ("教育学习", &["学习", "教育", "学校", "课程", "培训", "考试", "考研", "考公", "留学", "证书"]),
    ("情感生活", &["恋爱", "爱情", "感情", "情侣", "表白", "单恋", "暗恋", "失恋", "分手"]),
    ("婚姻家庭", &["婚姻", "家庭", "结婚", "离婚", "夫妻", "子女", "婆媳", "亲子", "家人"]),
    ("身心健康", &["健康", "医疗", "身体", "心理", "疾病", "治疗", "保健", "锻炼", "饮食"]),
    ("休闲娱乐", &["娱乐", "休闲", "爱好", "兴趣", "电影", "音乐", "游戏", "旅游", "放松"]),
    ("住房生活", &["住房", "房子", "房价", "租房", "买房", "装修", "家居", "物业", "搬家"]),
    ("金融理财", &["理财", "投资", "金融", "存款", "贷款", "基金", "股票", "房贷", "保险"]),
    ("时事政治", &["政治", "时事", "新闻", "国际", "国内", "社会", "法律", "政策", "热点"]),
    ("科技数码", &["科技", "数码", "互联网", "手机", "电脑", "软件", "人工智能", "ai", "智能"]),
    ("环境保护", &["环保", "环境", "气候", "污染", "碳中和", "低碳", "可持续", "生态", "节能"]),
    ("个人成长", &["成长", "自我提升", "个人发展", "目标", "规划", "习惯", "时间管理", "自律"]),
];

/// Full four-letter MBTI types.
pub static MBTI_TYPES: &[TagKeywords] = &[
    ("INTJ", &["intj", "建筑师", "策划者", "战略家", "完美主义者", "逻辑", "规划", "独立", "高效"]),
    ("INTP", &["intp", "逻辑学家", "思想家", "理论家", "分析", "理论", "创新", "好奇", "抽象"]),
    ("ENTJ", &["entj", "指挥官", "领导者", "统帅", "果断", "组织", "领导", "高效率", "雄心勃勃"]),
    ("ENTP", &["entp", "辩论家", "发明家", "创新者", "思辨", "灵活", "机智", "辩论", "概念"]),
    ("INFJ", &["infj", "提倡者", "咨询师", "治愈者", "理想主义", "有洞察力", "直觉", "有同情心", "有远见"]),
    ("INFP", &["infp", "调停者", "治愈师", "梦想家", "和谐", "创意", "富有感情", "敏感", "内省"]),
    ("ENFJ", &["enfj", "主人公", "教导者", "引导者", "激励者", "有同理心", "热情", "合作", "外向"]),
    ("ENFP", &["enfp", "竞选者", "自由精神", "活力", "热情", "创意", "可能性", "自发", "有趣"]),
    ("ISTJ", &["istj", "物流师", "检查者", "务实", "可靠", "条理", "传统", "规则", "责任心"]),
    ("ISFJ", &["isfj", "守卫者", "保护者", "守护者", "温暖", "尽责", "服务", "安静", "细心"]),
    ("ESTJ", &["estj", "总经理", "监督者", "管理者", "有条理", "实际", "直接", "执行", "责任"]),
    ("ESFJ", &["esfj", "执政官", "照顾者", "主持人", "友善", "和谐", "忠诚", "合作", "热情"]),
    ("ISTP", &["istp", "鉴赏家", "技师", "手艺人", "灵活", "实际", "独立", "冷静", "观察"]),
    ("ISFP", &["isfp", "冒险家", "艺术家", "创作者", "艺术性", "敏感", "平和", "自由", "温和"]),
    ("ESTP", &["estp", "企业家", "挑战者", "冒险家", "精力充沛", "实用", "即兴", "现实", "风险"]),
    ("ESFP", &["esfp", "表演者", "艺人", "娱乐者", "自发", "热情", "友好", "乐观", "适应"]),
];

/// Extraversion / introversion dimension.
pub static MBTI_EI: &[TagKeywords] = &[
    ("内向", &[
        "i人", "内向", "独处", "安静", "深思", "反思", "沉思", "社恐", "独自",
        "一个人", "不社交", "宅", "不爱说话", "社交恐惧", "社交耗能", "人多就累",
        "独处充电",
    ]),
    ("外向", &[
        "e人", "外向", "群体", "活跃", "社交", "互动", "表达", "社牛", "派对",
        "聚会", "热闹", "喜欢说话", "热爱交流", "社交达人", "交际花", "人来疯",
        "社交充电",
    ]),
];

/// Sensing / intuition dimension.
pub static MBTI_SN: &[TagKeywords] = &[
    ("感觉", &[
        "s型", "感觉型", "实际", "具体", "事实", "细节", "现实", "经验", "传统",
        "实用", "踏实", "按部就班", "稳扎稳打", "五感", "实在",
    ]),
    ("直觉", &[
        "n型", "直觉型", "抽象", "概念", "想象", "创新", "未来", "可能性", "灵感",
        "理论", "超前", "跳跃思维", "异想天开", "联想", "直觉", "第六感",
    ]),
];

/// Thinking / feeling dimension.
pub static MBTI_TF: &[TagKeywords] = &[
    ("思考", &[
        "t型", "思考型", "逻辑", "分析", "客观", "理性", "公正", "批判", "真相",
        "理智", "冷静", "公平", "原则", "规则", "系统", "标准",
    ]),
    ("感受", &[
        "f型", "感受型", "情感", "价值观", "主观", "和谐", "同理心", "包容",
        "共情", "温暖", "善良", "感性", "关怀", "善解人意", "感同身受",
    ]),
];

/// Judging / perceiving dimension.
pub static MBTI_JP: &[TagKeywords] = &[
    ("判断", &[
        "j型", "判断型", "计划", "确定", "决策", "组织", "目标", "期限", "控制",
        "秩序", "规划", "条理", "决断", "执行", "截止日期", "井井有条", "做清单",
        "按计划", "不拖延", "ddl驱动",
    ]),
    ("感知", &[
        "p型", "感知型", "灵活", "适应", "开放", "自发", "选择", "过程", "享受",
        "随性", "随遇而安", "顺其自然", "见机行事", "拖延", "拖延症",
        "临时抱佛脚", "deadline战士",
    ]),
];

/// Word-level sentiment weights in [-1, 1].
static SENTIMENT: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    let entries: &[(&str, f32)] = &[
        ("开心", 0.8), ("高兴", 0.7), ("快乐", 0.8), ("喜悦", 0.8), ("欣喜", 0.7),
        ("兴奋", 0.9), ("开朗", 0.6), ("愉悦", 0.6), ("满足", 0.5), ("感激", 0.6),
        ("感谢", 0.6), ("爱", 0.8), ("喜欢", 0.6), ("热爱", 0.7), ("幸福", 0.8),
        ("轻松", 0.5), ("放松", 0.4), ("期待", 0.5), ("激动", 0.7), ("振奋", 0.6),
        ("雀跃", 0.7),
        ("悲伤", -0.7), ("难过", -0.6), ("伤心", -0.7), ("失落", -0.5), ("沮丧", -0.6),
        ("忧郁", -0.6), ("痛苦", -0.8), ("难受", -0.6), ("emo", -0.6), ("丧", -0.7),
        ("抑郁", -0.9), ("绝望", -0.9), ("哭", -0.6), ("泪", -0.5), ("心疼", -0.5),
        ("挫折", -0.5),
        ("愤怒", -0.8), ("恼火", -0.7), ("生气", -0.7), ("气愤", -0.7), ("暴怒", -0.9),
        ("恨", -0.8), ("恼怒", -0.7), ("烦躁", -0.6), ("不爽", -0.5), ("厌烦", -0.6),
        ("厌恶", -0.7), ("憎恨", -0.8), ("讨厌", -0.6),
        ("焦虑", -0.7), ("忧虑", -0.6), ("担心", -0.5), ("紧张", -0.5), ("烦恼", -0.5),
        ("心慌", -0.6), ("害怕", -0.7), ("恐惧", -0.8), ("慌张", -0.6), ("不安", -0.5),
        ("惊慌", -0.7), ("惶恐", -0.7),
        ("平静", 0.3), ("冷静", 0.2), ("淡定", 0.3), ("理性", 0.2), ("镇定", 0.2),
        ("从容", 0.4), ("安宁", 0.4),
    ];
    entries.iter().copied().collect()
});

/// Intensity modifiers that boost an immediately following emotion keyword.
pub static INTENSIFIERS: &[&str] = &["非常", "很", "极其", "太", "真", "好", "特别", "格外"];

/// Explicit communication-style preference expressions and the tag adjustment
/// each one carries.
pub static COMM_PREFERENCES: &[(&str, &str, f32)] = &[
    ("更简洁", "简洁", 0.1),
    ("更详细", "详细", 0.1),
    ("直接点", "直接", 0.1),
    ("专业点", "学术", 0.1),
    ("简单点", "口语化", 0.1),
    ("轻松点", "口语化", 0.1),
    ("幽默点", "幽默", 0.1),
    ("整活", "整活", 0.15),
    ("抽象", "整活", 0.15),
    ("别整活", "严肃", 0.15),
    ("严肃点", "严肃", 0.1),
];

/// Net slang markers counted toward the "网络用语" communication tag.
pub static NET_SLANG: &[&str] = &[
    "xswl", "yyds", "绝绝子", "awsl", "dbq", "emo", "蚌埠住了", "绷不住", "破防",
];

/// Keywords per lexicon category.
///
/// Categories without keyword tables (MBTI variants, preference, goal) return
/// an empty slice rather than failing: scorers treat them as "no matches".
pub fn keywords(category: TagCategory) -> &'static [TagKeywords] {
    match category {
        TagCategory::Interest => INTEREST,
        TagCategory::Knowledge => KNOWLEDGE,
        TagCategory::Personality => PERSONALITY,
        TagCategory::Communication => COMMUNICATION,
        TagCategory::Emotion => EMOTION,
        TagCategory::Value => VALUE,
        TagCategory::Subculture => SUBCULTURE,
        TagCategory::Topic => TOPIC,
        _ => &[],
    }
}

/// Sentiment weight of a word, if it is in the sentiment map.
pub fn sentiment(word: &str) -> Option<f32> {
    SENTIMENT.get(word).copied()
}

/// Every keyword across every table; the tokenizer builds its segmentation
/// vocabulary from this.
pub fn all_keywords() -> impl Iterator<Item = &'static str> {
    let tag_tables = [
        INTEREST, KNOWLEDGE, PERSONALITY, COMMUNICATION, EMOTION, VALUE,
        SUBCULTURE, TOPIC, MBTI_TYPES, MBTI_EI, MBTI_SN, MBTI_TF, MBTI_JP,
    ];
    tag_tables
        .into_iter()
        .flat_map(|table| table.iter())
        .flat_map(|(_, words)| words.iter().copied())
        .chain(SENTIMENT.keys().copied())
        .chain(INTENSIFIERS.iter().copied())
        .chain(NET_SLANG.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_lookup_defaults_to_empty() {
        assert!(keywords(TagCategory::Mbti).is_empty());
        assert!(keywords(TagCategory::Preference).is_empty());
        assert!(!keywords(TagCategory::Interest).is_empty());
    }

    #[test]
    fn sentiment_weights_are_bounded() {
        for word in all_keywords() {
            if let Some(weight) = sentiment(word) {
                assert!((-1.0..=1.0).contains(&weight), "{} out of range", word);
            }
        }
    }
}
