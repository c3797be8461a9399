//! In-page reveal and scroll scripts (SPEC_FULL §4.5 steps 2, 5-8): forcing
//! animated and lazy-loaded content to its settled end state before the DOM
//! is read.

use anyhow::Result;
use chromiumoxide::Page;

/// Progresses every known animation library's in-flight timelines to their
/// end state and materializes lazy-loaded content. Safe to call on a page
/// that uses none of these libraries — every step is feature-detected.
pub const REVEAL_SCRIPT: &str = r#"
(() => {
    try {
        if (window.gsap) {
            window.gsap.globalTimeline.getChildren(true, true, true).forEach((tl) => {
                try { tl.progress(1); } catch (e) {}
            });
        }
        if (window.ScrollTrigger && typeof window.ScrollTrigger.getAll === 'function') {
            window.ScrollTrigger.getAll().forEach((st) => {
                try { st.progress = 1; st.update(); } catch (e) {}
            });
        }
        if (window.anime && typeof window.anime.running !== 'undefined') {
            (window.anime.running || []).forEach((instance) => {
                try { instance.seek(instance.duration); } catch (e) {}
            });
        }
        document.getAnimations().forEach((animation) => {
            try { animation.finish(); } catch (e) {}
        });

        document.querySelectorAll('[data-aos]').forEach((el) => el.classList.add('aos-animate'));
        document.querySelectorAll('.wow').forEach((el) => el.classList.add('animated'));
        document.querySelectorAll('[data-sr-id]').forEach((el) => {
            el.style.opacity = '1';
            el.style.transform = 'none';
        });

        document.querySelectorAll('*').forEach((el) => {
            const style = window.getComputedStyle(el);
            if (style.opacity === '0') el.style.opacity = '1';
            if (style.visibility === 'hidden') el.style.visibility = 'visible';
        });

        document.querySelectorAll('img[data-src], img[data-lazy-src]').forEach((img) => {
            const src = img.getAttribute('data-src') || img.getAttribute('data-lazy-src');
            if (src) img.src = src;
            const srcset = img.getAttribute('data-srcset');
            if (srcset) img.srcset = srcset;
        });
        document.querySelectorAll('iframe[data-src]').forEach((frame) => {
            frame.src = frame.getAttribute('data-src');
        });
        document.querySelectorAll('[data-bg], [data-background]').forEach((el) => {
            const bg = el.getAttribute('data-bg') || el.getAttribute('data-background');
            if (bg) el.style.backgroundImage = `url("${bg}")`;
        });

        if (window.lottie && typeof window.lottie.getRegisteredAnimations === 'function') {
            window.lottie.getRegisteredAnimations().forEach((anim) => {
                try { anim.goToAndStop(anim.totalFrames, true); } catch (e) {}
            });
        }
    } catch (e) {
        // Best-effort: a missing/unexpected animation library must not abort capture.
    }
})();
"#;

/// Scrolls the page to the bottom in human-sized, eased steps, pausing for
/// lazy content to append, then returns to the top.
pub const SCROLL_SCRIPT: &str = r#"
(async () => {
    const step = __SCROLL_STEP__;
    const pause = (ms) => new Promise((resolve) => setTimeout(resolve, ms));
    const ease = (t) => t < 0.5 ? 2 * t * t : 1 - Math.pow(-2 * t + 2, 2) / 2;

    let lastHeight = document.body.scrollHeight;
    let stableRounds = 0;
    while (stableRounds < 2) {
        const current = window.scrollY;
        const target = Math.min(current + step, document.body.scrollHeight);
        const distance = target - current;
        const frames = 8;
        for (let i = 1; i <= frames; i++) {
            window.scrollTo(0, current + distance * ease(i / frames));
            await pause(30);
        }
        await pause(200);

        const newHeight = document.body.scrollHeight;
        if (newHeight === lastHeight && window.scrollY + window.innerHeight >= newHeight - 4) {
            stableRounds += 1;
        } else {
            stableRounds = 0;
        }
        lastHeight = newHeight;
    }

    await pause(300);
    window.scrollTo(0, 0);
    await pause(200);
})();
"#;

/// Final pass once network idle is reached: forces remaining hidden/animated
/// elements to their settled state and disables CSS animations outright so a
/// later screenshot or HTML read never captures a mid-transition frame.
pub const FINAL_REVEAL_SCRIPT: &str = r#"
(() => {
    const suspect = /anim|fade|slide|reveal|show/i;
    document.querySelectorAll('*').forEach((el) => {
        if (!suspect.test(el.className || '')) return;
        const style = window.getComputedStyle(el);
        if (style.opacity === '0') el.style.setProperty('opacity', '1', 'important');
        if (style.visibility === 'hidden') el.style.setProperty('visibility', 'visible', 'important');
        if (style.transform && style.transform !== 'none') {
            el.style.setProperty('transform', 'none', 'important');
        }
    });

    const style = document.createElement('style');
    style.textContent = '*, *::before, *::after { animation: none !important; transition: none !important; }';
    document.head.appendChild(style);
})();
"#;

/// Runs [`REVEAL_SCRIPT`] in the page.
pub async fn reveal(page: &Page) -> Result<()> {
    page.evaluate(REVEAL_SCRIPT).await?;
    Ok(())
}

/// Runs the human-like scroll-to-bottom-and-back sequence.
pub async fn scroll(page: &Page, step_px: u32) -> Result<()> {
    let script = SCROLL_SCRIPT.replace("__SCROLL_STEP__", &step_px.to_string());
    page.evaluate(script).await?;
    Ok(())
}

/// Runs [`FINAL_REVEAL_SCRIPT`] in the page.
pub async fn final_reveal(page: &Page) -> Result<()> {
    page.evaluate(FINAL_REVEAL_SCRIPT).await?;
    Ok(())
}
